//! Error types for the core library

use thiserror::Error;

/// Errors raised while preparing mapper inputs
#[derive(Error, Debug)]
pub enum CoreError {
    /// Error reading or copying files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An image could not be prepared as an asset
    #[error("Image error: {0}")]
    Image(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
