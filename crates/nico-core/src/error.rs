//! Error types for nico-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport read or write failed
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A read returned no data before the link gave up waiting
    #[error("timed out waiting for data")]
    Timeout,

    /// The target replied with something that is not a hex byte
    #[error("invalid reply {0:?}")]
    BadReply(String),

    /// An object file could not be opened or read
    #[error("{0}")]
    File(std::io::Error),

    /// An Intel HEX file is malformed
    #[error("{0}")]
    HexFile(#[from] ihex::ReaderError),

    /// A bulk transfer was cancelled by the user or the receiver
    #[error("Transfer cancelled!")]
    Cancelled,

    /// A bulk transfer protocol failure
    #[error("{0}")]
    Protocol(String),
}

/// Result type for nico-core operations
pub type Result<T> = core::result::Result<T, Error>;
