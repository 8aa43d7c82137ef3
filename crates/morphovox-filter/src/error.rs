//! Error types for morphovox-filter

use thiserror::Error;

/// Errors that can occur during filtering operations
#[derive(Debug, Error)]
pub enum FilterError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] morphovox_core::Error),

    /// Invalid kernel
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl FilterError {
    /// Whether the operation was interrupted through its cancel token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FilterError::Core(e) if e.is_cancelled())
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;
