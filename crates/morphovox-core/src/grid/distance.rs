//! Distance map helpers
//!
//! A distance map stores, for each voxel, the distance to the nearest
//! background voxel. Voxels with a value > 0 are foreground; everything
//! else is background and is ignored by the flooding and tree algorithms.

use super::{DistanceMap, MaskGrid};
use crate::point::Point3;

impl DistanceMap {
    /// Whether the voxel at `index` belongs to the foreground.
    #[inline]
    pub fn is_foreground(&self, index: usize) -> bool {
        self.data[index] > 0.0
    }

    /// Number of foreground voxels.
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0.0).count()
    }

    /// Foreground mask (`value > 0`).
    pub fn foreground_mask(&self) -> MaskGrid {
        self.map(|&v| v > 0.0)
    }

    /// Maximum value and its position.
    ///
    /// Among equal maxima the last one in scan order wins. NaN voxels are
    /// never selected.
    pub fn max_with_position(&self) -> (f64, Point3) {
        let mut max = f64::NEG_INFINITY;
        let mut at = 0usize;
        for (i, &v) in self.data.iter().enumerate() {
            if v >= max {
                max = v;
                at = i;
            }
        }
        (max, self.position_of(at))
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::VoxelGrid;
    use crate::point::Point3;

    #[test]
    fn test_max_last_found_wins() {
        let grid = VoxelGrid::from_data(4, 1, 1, vec![1.0, 3.0, 2.0, 3.0]).unwrap();
        let (max, at) = grid.max_with_position();
        assert_eq!(max, 3.0);
        assert_eq!(at, Point3::new(3, 0, 0));
    }

    #[test]
    fn test_foreground_mask() {
        let grid = VoxelGrid::from_data(3, 1, 1, vec![0.0, 0.5, -1.0]).unwrap();
        assert_eq!(grid.foreground_count(), 1);
        assert_eq!(grid.foreground_mask().data(), &[false, true, false]);
    }
}
