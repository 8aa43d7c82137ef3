//! Error types for morphovox-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Every downstream crate wraps this type, so the cancellation condition
//! raised by [`CancelToken::check`](crate::CancelToken::check) travels
//! unchanged from the innermost loop to the caller.

use thiserror::Error;

/// morphovox error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid grid dimensions
    #[error("invalid grid dimensions: {width}x{height}x{depth}")]
    InvalidDimension { width: u32, height: u32, depth: u32 },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Voxel position outside the grid
    #[error("position ({x}, {y}, {z}) outside grid")]
    PositionOutOfBounds { x: u32, y: u32, z: u32 },

    /// Grid dimension mismatch
    #[error(
        "dimension mismatch: expected {}x{}x{}, got {}x{}x{}",
        .expected.0, .expected.1, .expected.2, .actual.0, .actual.1, .actual.2
    )]
    DimensionMismatch {
        expected: (u32, u32, u32),
        actual: (u32, u32, u32),
    },

    /// Invalid physical voxel size
    #[error("invalid voxel size: ({x}, {y}, {z})")]
    InvalidVoxelSize { x: f64, y: f64, z: f64 },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Empty input
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// The computation was interrupted through its cancellation token
    #[error("computation interrupted")]
    Cancelled,
}

impl Error {
    /// Whether this error is the cancellation condition.
    ///
    /// A cancelled computation produced no usable result; it is not a
    /// failure of the input.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for morphovox operations
pub type Result<T> = std::result::Result<T, Error>;
