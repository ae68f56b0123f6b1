//! File-based read-only storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Advisory locking applied when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Take a non-blocking shared lock, like a GDBM reader does.
    #[default]
    Shared,
    /// Do not lock the file.
    None,
}

/// A read-only file storage backend.
///
/// The file is opened without write access and is never created: a
/// missing path is an error. With [`LockMode::Shared`] a shared advisory
/// lock is held until the backend is dropped, so a process holding the
/// writer lock makes the open fail instead of exposing a half-written file.
///
/// # Thread Safety
///
/// Reads seek the shared handle, so the handle sits behind a lock.
///
/// # Example
///
/// ```no_run
/// use dbreader_storage::{FileBackend, LockMode, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("users.db"), LockMode::Shared).unwrap();
/// let header = backend.read_at(0, 4).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: u64,
}

impl FileBackend {
    /// Opens an existing file for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be opened, or
    /// (with [`LockMode::Shared`]) another process holds an exclusive lock.
    pub fn open(path: &Path, lock: LockMode) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).open(path)?;

        if lock == LockMode::Shared && FileExt::try_lock_shared(&file).is_err() {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.size;
        let end = offset.saturating_add(len as u64);

        if offset > size || end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }
}
