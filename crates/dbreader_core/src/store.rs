//! Key-value store capability traits.
//!
//! The walker and batch driver only need ordered full-scan iteration and
//! point lookup. Any engine that offers these can back an export:
//!
//! | Capability     | Method                          |
//! |----------------|---------------------------------|
//! | open read-only | [`StoreOpener::open_read_only`] |
//! | first key      | [`KeyValueStore::first_key`]    |
//! | next key       | [`KeyValueStore::next_key`]     |
//! | fetch          | [`KeyValueStore::fetch`]        |
//! | close          | `Drop`                          |

use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::{Path, PathBuf};

/// A read-only view over one key-value database.
///
/// Keys come back in store order, which is whatever the engine defines.
/// Every returned buffer is owned by the caller.
pub trait KeyValueStore {
    /// Returns the first key in store order, or `None` if the store is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data cannot be read.
    fn first_key(&mut self) -> CoreResult<Option<Vec<u8>>>;

    /// Returns the key after `key` in store order, or `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data cannot be read.
    fn next_key(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>>;

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data cannot be read.
    fn fetch(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn first_key(&mut self) -> CoreResult<Option<Vec<u8>>> {
        (**self).first_key()
    }

    fn next_key(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        (**self).next_key(key)
    }

    fn fetch(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        (**self).fetch(key)
    }
}

/// Opens stores by path without creating or modifying them.
pub trait StoreOpener {
    /// The store type produced.
    type Store: KeyValueStore;

    /// Opens the database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is missing, unreadable, locked, or not
    /// a database this opener understands.
    fn open_read_only(&self, path: &Path) -> CoreResult<Self::Store>;
}

/// An in-memory store ordered by key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record.
    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn first_key(&mut self) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.keys().next().cloned())
    }

    fn next_key(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self
            .entries
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(next, _)| next.clone()))
    }

    fn fetch(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}

/// Opens [`MemoryStore`]s registered under paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    stores: HashMap<PathBuf, MemoryStore>,
}

impl MemoryOpener {
    /// Creates an opener with no stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` under `path`.
    #[must_use]
    pub fn with_store(mut self, path: impl Into<PathBuf>, store: MemoryStore) -> Self {
        self.stores.insert(path.into(), store);
        self
    }
}

impl StoreOpener for MemoryOpener {
    type Store = MemoryStore;

    fn open_read_only(&self, path: &Path) -> CoreResult<MemoryStore> {
        self.stores.get(path).cloned().ok_or_else(|| {
            CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no store registered at {}", path.display()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_iterates_in_key_order() {
        let mut store: MemoryStore = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();

        let mut keys = Vec::new();
        let mut current = store.first_key().unwrap();
        while let Some(key) = current {
            current = store.next_key(&key).unwrap();
            keys.push(key);
        }

        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn memory_store_empty_has_no_first_key() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.first_key().unwrap(), None);
    }

    #[test]
    fn memory_store_fetch() {
        let mut store = MemoryStore::new();
        store.insert("k", "v");
        assert_eq!(store.len(), 1);
        assert_eq!(store.fetch(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.fetch(b"missing").unwrap(), None);
    }

    #[test]
    fn memory_store_next_after_unknown_key() {
        let mut store: MemoryStore = [("a", "1"), ("c", "3")].into_iter().collect();
        assert_eq!(store.next_key(b"b").unwrap(), Some(b"c".to_vec()));
        assert_eq!(store.next_key(b"c").unwrap(), None);
    }

    #[test]
    fn memory_opener_unknown_path_fails() {
        let opener = MemoryOpener::new().with_store("a.db", MemoryStore::new());
        assert!(opener.open_read_only(Path::new("a.db")).is_ok());
        assert!(opener.open_read_only(Path::new("b.db")).is_err());
    }
}
