//! Error types for morphovox-morph

use thiserror::Error;

/// Errors that can occur during morphological operations
#[derive(Debug, Error)]
pub enum MorphError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] morphovox_core::Error),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl MorphError {
    /// Whether the operation was interrupted through its cancel token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MorphError::Core(e) if e.is_cancelled())
    }
}

/// Result type for morphological operations
pub type MorphResult<T> = Result<T, MorphError>;
