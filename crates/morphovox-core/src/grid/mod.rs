//! VoxelGrid - dense 3D voxel array
//!
//! `VoxelGrid<T>` is the container every algorithm in morphovox reads and
//! writes: distance maps (`f64`), label volumes (`u32`) and masks (`bool`).
//! A grid of depth 1 is a 2D image; neighbor enumeration then drops the z
//! offsets automatically.
//!
//! See [`distance`] for operations specific to distance maps.
//!
//! # Examples
//!
//! ```
//! use morphovox_core::{DistanceMap, Point3};
//!
//! let mut grid = DistanceMap::new(10, 8, 4).unwrap();
//! grid.set(2, 3, 1, 0.5).unwrap();
//! assert_eq!(grid.get(2, 3, 1).unwrap(), 0.5);
//! assert_eq!(grid.get_at(Point3::new(0, 0, 0)).unwrap(), 0.0);
//! assert!(grid.get(10, 0, 0).is_err());
//! ```

pub mod distance;

use crate::error::{Error, Result};
use crate::neighborhood::{Connectivity, Offset};
use crate::point::Point3;
use crate::size::VoxelSize;

/// Distance-to-background map. Foreground voxels hold a value > 0.
pub type DistanceMap = VoxelGrid<f64>;

/// Integer label volume. 0 is background or "no label".
pub type LabelGrid = VoxelGrid<u32>;

/// Boolean voxel mask.
pub type MaskGrid = VoxelGrid<bool>;

/// Dense 3D grid of voxel values
///
/// # Memory Layout
///
/// Data is stored with x varying fastest, then y, then z, with no padding.
/// The voxel at (x, y, z) is at index `(z * height + y) * width + x`. The
/// total voxel count is limited to `u32::MAX` so that voxel indices fit in
/// 32 bits.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid<T> {
    /// Width in voxels (x)
    width: u32,
    /// Height in voxels (y)
    height: u32,
    /// Depth in voxels (z), 1 for a 2D image
    depth: u32,
    /// Physical voxel spacing
    voxel_size: VoxelSize,
    /// Voxel data
    data: Vec<T>,
}

fn checked_len(width: u32, height: u32, depth: u32) -> Result<usize> {
    let invalid = Error::InvalidDimension {
        width,
        height,
        depth,
    };
    if width == 0 || height == 0 || depth == 0 {
        return Err(invalid);
    }
    let len = (width as u64) * (height as u64) * (depth as u64);
    if len > u32::MAX as u64 {
        return Err(invalid);
    }
    Ok(len as usize)
}

impl<T: Clone + Default> VoxelGrid<T> {
    /// Create a grid with every voxel set to `T::default()`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if a dimension is 0 or the voxel
    /// count does not fit in `u32`.
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self> {
        Self::new_with_value(width, height, depth, T::default())
    }
}

impl<T: Clone> VoxelGrid<T> {
    /// Create a grid with every voxel set to `value`
    pub fn new_with_value(width: u32, height: u32, depth: u32, value: T) -> Result<Self> {
        let len = checked_len(width, height, depth)?;
        Ok(Self {
            width,
            height,
            depth,
            voxel_size: VoxelSize::default(),
            data: vec![value; len],
        })
    }

    /// Create a grid with the same dimensions and voxel size as `other`,
    /// filled with `value`.
    pub fn like<U>(other: &VoxelGrid<U>, value: T) -> Self {
        Self {
            width: other.width,
            height: other.height,
            depth: other.depth,
            voxel_size: other.voxel_size,
            data: vec![value; other.data.len()],
        }
    }

    /// Set every voxel to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value.clone());
    }
}

impl<T> VoxelGrid<T> {
    /// Create a grid from raw data in x-fastest order
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are invalid or the data length
    /// does not match.
    pub fn from_data(width: u32, height: u32, depth: u32, data: Vec<T>) -> Result<Self> {
        let len = checked_len(width, height, depth)?;
        if data.len() != len {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{}x{} = {}",
                data.len(),
                width,
                height,
                depth,
                len
            )));
        }
        Ok(Self {
            width,
            height,
            depth,
            voxel_size: VoxelSize::default(),
            data,
        })
    }

    /// Width in voxels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in voxels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth in voxels
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Dimensions as (width, height, depth)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.depth)
    }

    /// Number of voxels
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a grid has at least one voxel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the grid is a single plane.
    #[inline]
    pub fn is_2d(&self) -> bool {
        self.depth == 1
    }

    /// Physical voxel spacing
    #[inline]
    pub fn voxel_size(&self) -> VoxelSize {
        self.voxel_size
    }

    /// Set the physical voxel spacing
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidVoxelSize` for non-positive or non-finite
    /// components; the grid is left unchanged.
    pub fn set_voxel_size(&mut self, size: VoxelSize) -> Result<()> {
        size.validate()?;
        self.voxel_size = size;
        Ok(())
    }

    /// Builder form of [`set_voxel_size`](Self::set_voxel_size)
    pub fn with_voxel_size(mut self, size: VoxelSize) -> Result<Self> {
        self.set_voxel_size(size)?;
        Ok(self)
    }

    /// Linear index of (x, y, z), or `None` when outside the grid
    #[inline]
    pub fn index_of(&self, x: u32, y: u32, z: u32) -> Option<usize> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return None;
        }
        Some(self.index_unchecked(x, y, z))
    }

    #[inline]
    fn index_unchecked(&self, x: u32, y: u32, z: u32) -> usize {
        ((z as usize) * (self.height as usize) + (y as usize)) * (self.width as usize)
            + (x as usize)
    }

    /// Position of a linear index.
    ///
    /// The index must be smaller than [`len`](Self::len).
    #[inline]
    pub fn position_of(&self, index: usize) -> Point3 {
        let w = self.width as usize;
        let plane = w * self.height as usize;
        Point3 {
            x: (index % w) as u32,
            y: ((index % plane) / w) as u32,
            z: (index / plane) as u32,
        }
    }

    /// Whether `p` lies inside the grid
    #[inline]
    pub fn contains(&self, p: Point3) -> bool {
        p.x < self.width && p.y < self.height && p.z < self.depth
    }

    /// Raw data in x-fastest order
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw data in x-fastest order
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the grid and return its data
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Iterate over all positions in scan order (z, then y, then x).
    pub fn positions(&self) -> impl Iterator<Item = Point3> + '_ {
        (0..self.data.len()).map(move |i| self.position_of(i))
    }

    /// Apply `f` to every voxel, keeping dimensions and voxel size.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> VoxelGrid<U> {
        VoxelGrid {
            width: self.width,
            height: self.height,
            depth: self.depth,
            voxel_size: self.voxel_size,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Check that `other` has the same dimensions
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` otherwise.
    pub fn check_same_dimensions<U>(&self, other: &VoxelGrid<U>) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        Ok(())
    }

    /// Neighbor offsets of `connectivity` for this grid.
    ///
    /// On a 2D grid the z offsets are omitted.
    pub fn offsets(&self, connectivity: Connectivity) -> Vec<Offset> {
        connectivity.offsets(self.is_2d())
    }

    /// Apply an offset to a position, returning the neighbor's linear index
    /// when it lies inside the grid.
    #[inline]
    pub fn offset_index(&self, p: Point3, (dx, dy, dz): Offset) -> Option<usize> {
        let x = p.x as i64 + dx as i64;
        let y = p.y as i64 + dy as i64;
        let z = p.z as i64 + dz as i64;
        if x < 0
            || y < 0
            || z < 0
            || x >= self.width as i64
            || y >= self.height as i64
            || z >= self.depth as i64
        {
            return None;
        }
        Some(self.index_unchecked(x as u32, y as u32, z as u32))
    }

    /// In-bounds neighbors of the voxel at `index`.
    ///
    /// Yields `(neighbor_index, offset)` pairs in the order of `offsets`.
    pub fn neighbors<'a>(
        &'a self,
        index: usize,
        offsets: &'a [Offset],
    ) -> impl Iterator<Item = (usize, Offset)> + 'a {
        let p = self.position_of(index);
        offsets
            .iter()
            .filter_map(move |&o| self.offset_index(p, o).map(|n| (n, o)))
    }
}

impl<T: Copy> VoxelGrid<T> {
    /// Get the voxel value at (x, y, z)
    ///
    /// # Errors
    ///
    /// Returns `Error::PositionOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Result<T> {
        self.index_of(x, y, z)
            .map(|i| self.data[i])
            .ok_or(Error::PositionOutOfBounds { x, y, z })
    }

    /// Get the voxel value at `p`
    #[inline]
    pub fn get_at(&self, p: Point3) -> Result<T> {
        self.get(p.x, p.y, p.z)
    }

    /// Get the voxel value at a linear index
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if `index >= len()`.
    #[inline]
    pub fn get_index(&self, index: usize) -> Result<T> {
        self.data
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                index,
                len: self.data.len(),
            })
    }

    /// Set the voxel value at (x, y, z)
    ///
    /// # Errors
    ///
    /// Returns `Error::PositionOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, value: T) -> Result<()> {
        let i = self
            .index_of(x, y, z)
            .ok_or(Error::PositionOutOfBounds { x, y, z })?;
        self.data[i] = value;
        Ok(())
    }

    /// Set the voxel value at `p`
    #[inline]
    pub fn set_at(&mut self, p: Point3, value: T) -> Result<()> {
        self.set(p.x, p.y, p.z, value)
    }
}
