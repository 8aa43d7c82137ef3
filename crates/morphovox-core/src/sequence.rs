//! VoxelSequence - time series of voxel grids
//!
//! A sequence is an ordered list of frames sharing dimensions and voxel
//! size. Algorithms never look across frames: each time point is processed
//! as an independent 3D volume.

use crate::error::{Error, Result};
use crate::grid::VoxelGrid;

/// Ordered frames of identical extent
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelSequence<T> {
    frames: Vec<VoxelGrid<T>>,
}

impl<T> VoxelSequence<T> {
    /// Create a sequence from frames
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyInput` for an empty list and
    /// `Error::DimensionMismatch` if frame dimensions differ.
    pub fn new(frames: Vec<VoxelGrid<T>>) -> Result<Self> {
        let first = frames.first().ok_or(Error::EmptyInput("sequence frames"))?;
        for frame in &frames[1..] {
            first.check_same_dimensions(frame)?;
        }
        Ok(Self { frames })
    }

    /// Single-frame sequence
    pub fn single(frame: VoxelGrid<T>) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    /// Append a frame
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the frame extent differs.
    pub fn push(&mut self, frame: VoxelGrid<T>) -> Result<()> {
        if let Some(first) = self.frames.first() {
            first.check_same_dimensions(&frame)?;
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Frame at time index `t`
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if `t >= len()`.
    pub fn frame(&self, t: usize) -> Result<&VoxelGrid<T>> {
        self.frames.get(t).ok_or(Error::IndexOutOfBounds {
            index: t,
            len: self.frames.len(),
        })
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed sequence
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Dimensions shared by every frame
    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.frames[0].dimensions()
    }

    /// Iterate over frames in time order
    pub fn iter(&self) -> std::slice::Iter<'_, VoxelGrid<T>> {
        self.frames.iter()
    }

    /// Frames as a slice
    pub fn frames(&self) -> &[VoxelGrid<T>] {
        &self.frames
    }

    /// Consume the sequence and return its frames
    pub fn into_frames(self) -> Vec<VoxelGrid<T>> {
        self.frames
    }
}

impl<'a, T> IntoIterator for &'a VoxelSequence<T> {
    type Item = &'a VoxelGrid<T>;
    type IntoIter = std::slice::Iter<'a, VoxelGrid<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
