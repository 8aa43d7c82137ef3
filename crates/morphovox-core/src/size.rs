//! VoxelSize - physical spacing of a voxel grid
//!
//! Distances, smoothing widths and path lengths are all measured in the
//! physical units given here, so that anisotropic acquisitions (a z step
//! larger than the in-plane pixel size is typical for microscopy stacks)
//! are weighted correctly.

use crate::error::{Error, Result};

/// Physical size of one voxel along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelSize {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for VoxelSize {
    fn default() -> Self {
        Self::isotropic()
    }
}

impl VoxelSize {
    /// Create a voxel size.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVoxelSize` unless every component is finite and
    /// strictly positive.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        let size = Self { x, y, z };
        size.validate()?;
        Ok(size)
    }

    /// Unit spacing on every axis.
    pub const fn isotropic() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }

    /// Check that every component is finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.x) && ok(self.y) && ok(self.z) {
            Ok(())
        } else {
            Err(Error::InvalidVoxelSize {
                x: self.x,
                y: self.y,
                z: self.z,
            })
        }
    }

    /// Whether all three axes share the same spacing.
    pub fn is_isotropic(&self) -> bool {
        self.x == self.y && self.y == self.z
    }

    /// Physical Euclidean length of a voxel offset.
    #[inline]
    pub fn offset_length(&self, dx: i64, dy: i64, dz: i64) -> f64 {
        let px = dx as f64 * self.x;
        let py = dy as f64 * self.y;
        let pz = dz as f64 * self.z;
        (px * px + py * py + pz * pz).sqrt()
    }

    /// Squared physical length of a voxel offset.
    #[inline]
    pub fn offset_length_squared(&self, dx: i64, dy: i64, dz: i64) -> f64 {
        let px = dx as f64 * self.x;
        let py = dy as f64 * self.y;
        let pz = dz as f64 * self.z;
        px * px + py * py + pz * pz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_positive() {
        assert!(VoxelSize::new(1.0, 1.0, 0.0).is_err());
        assert!(VoxelSize::new(-1.0, 1.0, 1.0).is_err());
        assert!(VoxelSize::new(1.0, f64::NAN, 1.0).is_err());
        assert!(VoxelSize::new(0.2, 0.2, 1.5).is_ok());
    }

    #[test]
    fn test_offset_length() {
        let size = VoxelSize::new(1.0, 1.0, 2.0).unwrap();
        assert_eq!(size.offset_length(1, 0, 0), 1.0);
        assert_eq!(size.offset_length(0, 0, -1), 2.0);
        assert!((size.offset_length(1, 1, 1) - 6.0f64.sqrt()).abs() < 1e-12);
        assert!(!size.is_isotropic());
    }
}
