//! GDBM database reader.
//!
//! Implements [`KeyValueStore`] directly over the on-disk format, without
//! the C library. The reader keeps the most recently used bucket decoded
//! and remembers the slot of the last key it returned, so a full scan
//! (`first_key`, then `fetch` and `next_key` on each returned key) reads
//! every bucket once and never hashes a key.
//!
//! Store order matches GDBM's own: directory entries in order, skipping
//! entries that repeat the bucket just visited, and slots in order within
//! each bucket.

use crate::error::{CoreError, CoreResult};
use crate::store::{KeyValueStore, StoreOpener};
use dbreader_format::{
    decode_directory, dir_index, hash, home_slot, Bucket, BucketElement, FileHeader,
    MAX_HEADER_LEN,
};
use dbreader_storage::{FileBackend, LockMode, StorageBackend};
use std::path::Path;
use tracing::debug;

/// A slot holding a live key.
#[derive(Debug, Clone, Copy)]
struct Position {
    dir_index: usize,
    slot: usize,
    element: BucketElement,
}

/// The last key handed out, and where it lives.
#[derive(Debug)]
struct Cursor {
    position: Position,
    key: Vec<u8>,
}

#[derive(Debug)]
struct CachedBucket {
    address: u64,
    bucket: Bucket,
}

/// A read-only GDBM database over any [`StorageBackend`].
#[derive(Debug)]
pub struct GdbmFile<B: StorageBackend = FileBackend> {
    backend: B,
    header: FileHeader,
    directory: Vec<u64>,
    cache: Option<CachedBucket>,
    cursor: Option<Cursor>,
}

impl<B: StorageBackend> GdbmFile<B> {
    /// Opens a database image held by `backend`.
    ///
    /// The header is decoded and checked against the backend size and the
    /// hash directory is loaded. Buckets are read lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a GDBM file, the header is
    /// inconsistent, or the directory cannot be read.
    pub fn open(backend: B) -> CoreResult<Self> {
        let size = backend.size()?;
        let header_bytes = backend.read_at(0, (MAX_HEADER_LEN as u64).min(size) as usize)?;
        let header = FileHeader::decode(&header_bytes)?;
        header.validate(size)?;

        let directory_bytes = backend.read_at(header.dir, header.dir_size as usize)?;
        let directory = decode_directory(&directory_bytes, header.layout, header.dir_entries())?;

        debug!(
            magic = ?header.magic,
            order = ?header.layout.order,
            width = ?header.layout.width,
            dir_bits = header.dir_bits,
            bucket_elems = header.bucket_elems,
            "opened GDBM image"
        );

        Ok(Self {
            backend,
            header,
            directory,
            cache: None,
            cursor: None,
        })
    }

    /// The decoded file header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Number of distinct buckets referenced by the directory.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        let mut addresses = self.directory.clone();
        addresses.sort_unstable();
        addresses.dedup();
        addresses.len()
    }

    fn bucket(&mut self, dir_index: usize) -> CoreResult<&Bucket> {
        let address = self.directory[dir_index];
        let cached = match self.cache.take() {
            Some(cached) if cached.address == address => cached,
            _ => CachedBucket {
                address,
                bucket: self.read_bucket(address)?,
            },
        };
        Ok(&self.cache.insert(cached).bucket)
    }

    fn read_bucket(&self, address: u64) -> CoreResult<Bucket> {
        let bytes = self
            .backend
            .read_at(address, self.header.bucket_size as usize)
            .map_err(|err| CoreError::corrupted(format!("bucket at {address}: {err}")))?;
        Ok(Bucket::decode(
            &bytes,
            self.header.layout,
            self.header.bucket_elems as usize,
        )?)
    }

    /// First live slot at or after (`dir_index`, `slot`) in store order.
    fn scan_from(&mut self, mut dir_index: usize, mut slot: usize) -> CoreResult<Option<Position>> {
        while dir_index < self.directory.len() {
            let found = self
                .bucket(dir_index)?
                .slots
                .iter()
                .enumerate()
                .skip(slot)
                .find_map(|(index, element)| element.map(|element| (index, element)));

            if let Some((slot, element)) = found {
                return Ok(Some(Position {
                    dir_index,
                    slot,
                    element,
                }));
            }

            let address = self.directory[dir_index];
            while dir_index < self.directory.len() && self.directory[dir_index] == address {
                dir_index += 1;
            }
            slot = 0;
        }
        Ok(None)
    }

    /// Finds `key` by hash probing.
    fn locate(&mut self, key: &[u8]) -> CoreResult<Option<Position>> {
        let key_hash = hash(key);
        let dir_index = dir_index(key_hash, self.header.dir_bits);
        let elems = self.header.bucket_elems as usize;
        let home = home_slot(key_hash, self.header.bucket_elems);

        let mut slot = home;
        loop {
            let Some(element) = self.bucket(dir_index)?.slots[slot] else {
                return Ok(None);
            };
            if element.may_hold(key_hash, key) && self.read_key(&element)? == key {
                return Ok(Some(Position {
                    dir_index,
                    slot,
                    element,
                }));
            }
            slot = (slot + 1) % elems;
            if slot == home {
                return Ok(None);
            }
        }
    }

    /// Position of `key`, from the cursor when it matches.
    fn position_of(&mut self, key: &[u8]) -> CoreResult<Option<Position>> {
        match &self.cursor {
            Some(cursor) if cursor.key == key => Ok(Some(cursor.position)),
            _ => self.locate(key),
        }
    }

    fn read_key(&self, element: &BucketElement) -> CoreResult<Vec<u8>> {
        self.read_span(element.data_pointer, element.key_size as usize)
    }

    fn read_value(&self, element: &BucketElement) -> CoreResult<Vec<u8>> {
        let start = element
            .data_pointer
            .checked_add(u64::from(element.key_size))
            .ok_or_else(|| CoreError::corrupted("data pointer overflows"))?;
        self.read_span(start, element.data_size as usize)
    }

    fn read_span(&self, offset: u64, len: usize) -> CoreResult<Vec<u8>> {
        self.backend
            .read_at(offset, len)
            .map_err(|err| CoreError::corrupted(format!("record at {offset}: {err}")))
    }

    /// Reads the key at `position` and makes it the cursor.
    fn advance_to(&mut self, position: Option<Position>) -> CoreResult<Option<Vec<u8>>> {
        let Some(position) = position else {
            self.cursor = None;
            return Ok(None);
        };
        let key = self.read_key(&position.element)?;
        self.cursor = Some(Cursor {
            position,
            key: key.clone(),
        });
        Ok(Some(key))
    }
}

impl<B: StorageBackend> KeyValueStore for GdbmFile<B> {
    fn first_key(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let position = self.scan_from(0, 0)?;
        self.advance_to(position)
    }

    fn next_key(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        let Some(current) = self.position_of(key)? else {
            return Ok(None);
        };
        let next = self.scan_from(current.dir_index, current.slot + 1)?;
        self.advance_to(next)
    }

    fn fetch(&mut self, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        match self.position_of(key)? {
            Some(position) => self.read_value(&position.element).map(Some),
            None => Ok(None),
        }
    }
}

/// Opens GDBM files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdbmOpener {
    lock_mode: LockMode,
}

impl GdbmOpener {
    /// Creates an opener using `lock_mode` for every file.
    #[must_use]
    pub const fn new(lock_mode: LockMode) -> Self {
        Self { lock_mode }
    }
}

impl StoreOpener for GdbmOpener {
    type Store = GdbmFile<FileBackend>;

    fn open_read_only(&self, path: &Path) -> CoreResult<Self::Store> {
        let backend = FileBackend::open(path, self.lock_mode)?;
        GdbmFile::open(backend)
    }
}
