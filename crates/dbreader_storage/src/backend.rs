//! Storage backend trait definition.

use crate::error::StorageResult;

/// A read-only storage backend.
///
/// Storage backends are **opaque byte sources**. They provide positional
/// reads and report their size. The GDBM reader owns all format
/// interpretation - backends do not understand headers, buckets, or records.
///
/// # Invariants
///
/// - `read_at` returns exactly `len` bytes or an error, never a short read
/// - `size` is stable for the lifetime of the backend
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For database files on disk
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The offset is beyond the current size
    /// - The read would extend beyond the current size
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Returns the size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Box<B> {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn size(&self) -> StorageResult<u64> {
        (**self).size()
    }
}
