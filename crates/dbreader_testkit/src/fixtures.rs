//! Temporary directories holding database files.

use crate::image::GdbmImage;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is removed on drop.
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    /// Creates an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Root of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `image` as `name` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_db(&self, name: &str, image: &GdbmImage) -> PathBuf {
        self.write_raw(name, &image.bytes)
    }

    /// Writes arbitrary bytes as `name` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_raw(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes).expect("Failed to write fixture file");
        path
    }

    /// Reads a file created during the test.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, path: &Path) -> Vec<u8> {
        fs::read(path).expect("Failed to read file")
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders records as TSV lines, in the given order.
#[must_use]
pub fn tsv_bytes<K, V>(records: &[(K, V)]) -> Vec<u8>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for (key, value) in records {
        out.extend_from_slice(key.as_ref());
        out.push(b'\t');
        out.extend_from_slice(value.as_ref());
        out.push(b'\n');
    }
    out
}
