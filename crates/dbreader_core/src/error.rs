//! Error types for dbreader core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while reading a database or exporting it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] dbreader_storage::StorageError),

    /// On-disk structure could not be decoded.
    #[error("format error: {0}")]
    Format(#[from] dbreader_format::FormatError),

    /// I/O error outside the output stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Writing the output file failed.
    #[error("output write failed: {0}")]
    OutputWrite(#[source] io::Error),

    /// The output path names the input file.
    #[error("output path {} is the input file", path.display())]
    OutputIsInput {
        /// The shared path.
        path: PathBuf,
    },

    /// The database is structurally damaged.
    #[error("database corrupted: {message}")]
    Corrupted {
        /// Description of the damage.
        message: String,
    },

    /// A key returned by the cursor has no value.
    #[error("key {key:?} vanished during iteration")]
    MissingValue {
        /// The key, lossily decoded for display.
        key: String,
    },
}

impl CoreError {
    /// Creates a corrupted database error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Creates a missing value error for `key`.
    pub fn missing_value(key: &[u8]) -> Self {
        Self::MissingValue {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}
