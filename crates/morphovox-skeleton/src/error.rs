//! Error types for morphovox-skeleton

use thiserror::Error;

/// Errors that can occur during skeletonization
#[derive(Debug, Error)]
pub enum SkeletonError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] morphovox_core::Error),

    /// Tree and distance map do not describe the same grid
    #[error("spanning tree covers {tree:?}, distance map is {distance:?}")]
    TreeMismatch {
        tree: (u32, u32, u32),
        distance: (u32, u32, u32),
    },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl SkeletonError {
    /// Whether the operation was interrupted through its cancel token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SkeletonError::Core(e) if e.is_cancelled())
    }
}

/// Result type for skeleton operations
pub type SkeletonResult<T> = Result<T, SkeletonError>;
