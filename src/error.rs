//! Error types for ipcity.

use thiserror::Error;

/// Error type for ipcity operations.
///
/// A lookup that finds no covering range is not an error; searchers
/// report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// Database file missing or unreadable, or a read failed mid-lookup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database contents violate the file format
    #[error("corrupt database: {0}")]
    CorruptData(String),

    /// File is too short to hold the index header
    #[error("invalid header size: expected {expected}, got {actual}")]
    InvalidHeaderSize { expected: usize, actual: usize },

    /// Input is not a dotted-quad IPv4 address
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed response from a third-party location provider
    #[error("provider error: {0}")]
    Provider(String),

    /// Process-wide database used before `init_database`
    #[error("database not initialized")]
    NotInitialized,
}

impl Error {
    /// Shorthand for building a [`Error::CorruptData`].
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptData(msg.into())
    }

    /// Whether this error means the database itself is broken.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptData(_) | Error::InvalidHeaderSize { .. }
        )
    }
}

/// Result type alias for ipcity operations.
pub type Result<T> = std::result::Result<T, Error>;
