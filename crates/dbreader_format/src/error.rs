//! Error types for the format crate.

use thiserror::Error;

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors that can occur while decoding GDBM structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The first four bytes are not a GDBM magic number in either byte order.
    #[error("not a GDBM file: unknown magic {found:#010x}")]
    BadMagic {
        /// The magic as read in little-endian order.
        found: u32,
    },

    /// The buffer ended before the structure was complete.
    #[error("unexpected end of input: needed {needed} bytes, {available} available")]
    UnexpectedEof {
        /// Bytes required to finish decoding.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// A header field is out of range or inconsistent.
    #[error("invalid header: {message}")]
    InvalidHeader {
        /// Description of the inconsistency.
        message: String,
    },

    /// A bucket field is out of range or inconsistent.
    #[error("invalid bucket: {message}")]
    InvalidBucket {
        /// Description of the inconsistency.
        message: String,
    },
}

impl FormatError {
    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an invalid bucket error.
    pub fn invalid_bucket(message: impl Into<String>) -> Self {
        Self::InvalidBucket {
            message: message.into(),
        }
    }
}
