//! Error types for morphovox-region

use thiserror::Error;

/// Errors that can occur during region processing operations
#[derive(Debug, Error)]
pub enum RegionError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] morphovox_core::Error),

    /// Smoothing error
    #[error("filter error: {0}")]
    Filter(#[from] morphovox_filter::FilterError),

    /// Invalid seed position
    #[error("invalid seed position: ({x}, {y}, {z})")]
    InvalidSeed { x: u32, y: u32, z: u32 },

    /// Invalid parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

impl RegionError {
    /// Whether the operation was interrupted through its cancel token
    pub fn is_cancelled(&self) -> bool {
        match self {
            RegionError::Core(e) => e.is_cancelled(),
            RegionError::Filter(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type for region operations
pub type RegionResult<T> = Result<T, RegionError>;
