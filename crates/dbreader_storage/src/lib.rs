//! # dbreader Storage
//!
//! Read-only storage backends for the dbreader exporter.
//!
//! This crate provides the lowest-level byte access used by the GDBM
//! reader. Storage backends are **opaque byte sources** - they do not
//! interpret the data they hold.
//!
//! ## Design Principles
//!
//! - Backends only read (positional reads plus size)
//! - No knowledge of the GDBM file format
//! - Opening a backend never creates or modifies a file
//! - Must be `Send + Sync`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and in-memory database images
//! - [`FileBackend`] - For database files on disk, optionally share-locked
//!
//! ## Example
//!
//! ```rust
//! use dbreader_storage::{StorageBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::with_data(b"hello world".to_vec());
//! let data = backend.read_at(6, 5).unwrap();
//! assert_eq!(&data, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{FileBackend, LockMode};
pub use memory::InMemoryBackend;
