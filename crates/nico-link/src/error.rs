//! Error types for link operations

use thiserror::Error;

/// Errors raised while opening a link
#[derive(Debug, Error)]
pub enum LinkError {
    /// The device path does not exist
    #[error("{0}: no such device")]
    NotFound(String),

    /// The path is neither a socket nor a character device
    #[error("{0} is neither a socket nor a character device")]
    Unsupported(String),

    /// Failed to connect to the device
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// I/O error while setting up the link
    #[error("I/O error: {0}")]
    Io(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for link operations
pub type Result<T> = core::result::Result<T, LinkError>;

impl From<std::io::Error> for LinkError {
    fn from(e: std::io::Error) -> Self {
        LinkError::Io(e.to_string())
    }
}
