//! Synthetic GDBM images.
//!
//! [`GdbmImageBuilder`] lays records out the way GDBM itself would find
//! them: each key goes to the bucket its hash selects and into the first
//! free slot at or after its home slot. The resulting image is a valid
//! read-only database for any byte order and offset width.

use dbreader_format::{
    dir_index, encode_directory, hash, home_slot, key_start, Bucket, BucketElement, FileHeader,
    Layout, Magic, OffsetWidth, HASH_BITS,
};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Reasons an image cannot be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixtureError {
    /// More keys hashed to one bucket than it has slots.
    #[error("bucket {bucket} is full ({elems} slots)")]
    BucketFull {
        /// Index of the overflowing bucket.
        bucket: usize,
        /// Slots per bucket.
        elems: u32,
    },

    /// The same key was added twice.
    #[error("duplicate key {0:?}")]
    DuplicateKey(Vec<u8>),

    /// The builder settings do not describe a valid file.
    #[error("invalid geometry: {0}")]
    Geometry(String),
}

/// A built image and the records it holds, in store order.
#[derive(Debug, Clone)]
pub struct GdbmImage {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl GdbmImage {
    /// Records in the order a full scan returns them.
    #[must_use]
    pub fn store_order(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.records.clone()
    }

    /// Writes the image to `path`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing the file.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, &self.bytes)
    }
}

/// Builds GDBM images from a list of records.
#[derive(Debug, Clone)]
pub struct GdbmImageBuilder {
    layout: Layout,
    magic: Option<Magic>,
    block_size: u32,
    dir_bits: u32,
    bucket_bits: u32,
    bucket_elems: Option<u32>,
    records: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Default for GdbmImageBuilder {
    fn default() -> Self {
        Self {
            layout: Layout::native64(),
            magic: None,
            block_size: 512,
            dir_bits: 0,
            bucket_bits: 0,
            bucket_elems: None,
            records: Vec::new(),
        }
    }
}

impl GdbmImageBuilder {
    /// Little-endian, 64-bit offsets, one bucket, 512-byte blocks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets byte order and offset width.
    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the magic. Defaults to the standard magic for the offset width.
    #[must_use]
    pub fn magic(mut self, magic: Magic) -> Self {
        self.magic = Some(magic);
        self
    }

    /// Sets the allocation block size.
    #[must_use]
    pub fn block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the directory depth.
    #[must_use]
    pub fn dir_bits(mut self, dir_bits: u32) -> Self {
        self.dir_bits = dir_bits;
        self
    }

    /// Sets the bucket depth. `2^bucket_bits` buckets are written.
    #[must_use]
    pub fn bucket_bits(mut self, bucket_bits: u32) -> Self {
        self.bucket_bits = bucket_bits;
        self
    }

    /// Sets slots per bucket. Defaults to as many as fit in a block.
    #[must_use]
    pub fn bucket_elems(mut self, bucket_elems: u32) -> Self {
        self.bucket_elems = Some(bucket_elems);
        self
    }

    /// Adds a record.
    #[must_use]
    pub fn record(mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.records.push((key.into(), value.into()));
        self
    }

    /// Adds several records.
    #[must_use]
    pub fn records<K, V>(mut self, records: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        self.records
            .extend(records.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Builds the image.
    ///
    /// # Panics
    ///
    /// Panics if [`try_build`](Self::try_build) fails.
    #[must_use]
    pub fn build(&self) -> GdbmImage {
        self.try_build().expect("Failed to build GDBM image")
    }

    /// Builds the image.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is invalid, a key repeats, or a
    /// bucket overflows.
    pub fn try_build(&self) -> Result<GdbmImage, FixtureError> {
        let layout = self.layout;
        let magic = self.resolve_magic()?;
        self.check_geometry()?;

        let elems = self.bucket_elems.unwrap_or_else(|| {
            let usable = (self.block_size as usize).saturating_sub(layout.bucket_table_offset());
            (usable / layout.element_len()).max(1) as u32
        });
        let block = u64::from(self.block_size);
        let bucket_size = layout.bucket_len(elems as usize).max(self.block_size as usize);

        let dir = block;
        let dir_size = (layout.offset_len() as u32) << self.dir_bits;
        let first_bucket = round_up(dir + u64::from(dir_size), block);
        let bucket_count = 1usize << self.bucket_bits;
        let data_start = first_bucket + (bucket_count * bucket_size) as u64;

        let mut buckets: Vec<Bucket> = (0..bucket_count)
            .map(|_| Bucket::empty(self.bucket_bits, elems as usize))
            .collect();
        let mut placed = vec![vec![None; elems as usize]; bucket_count];
        let mut data = Vec::new();
        let mut seen = HashSet::new();

        for (index, (key, value)) in self.records.iter().enumerate() {
            if !seen.insert(key.as_slice()) {
                return Err(FixtureError::DuplicateKey(key.clone()));
            }
            let key_hash = hash(key);
            let bucket_index = dir_index(key_hash, self.bucket_bits);
            let bucket = &mut buckets[bucket_index];
            let home = home_slot(key_hash, elems);
            let slot = (0..elems as usize)
                .map(|step| (home + step) % elems as usize)
                .find(|&slot| bucket.slots[slot].is_none())
                .ok_or(FixtureError::BucketFull {
                    bucket: bucket_index,
                    elems,
                })?;

            bucket.slots[slot] = Some(BucketElement {
                hash: key_hash,
                key_start: key_start(key),
                data_pointer: data_start + data.len() as u64,
                key_size: key.len() as u32,
                data_size: value.len() as u32,
            });
            bucket.count += 1;
            placed[bucket_index][slot] = Some(index);
            data.extend_from_slice(key);
            data.extend_from_slice(value);
        }

        let shift = self.dir_bits - self.bucket_bits;
        let directory: Vec<u64> = (0..1usize << self.dir_bits)
            .map(|entry| first_bucket + ((entry >> shift) * bucket_size) as u64)
            .collect();

        let header = FileHeader {
            magic,
            layout,
            block_size: self.block_size,
            dir,
            dir_size,
            dir_bits: self.dir_bits,
            bucket_size: bucket_size as u32,
            bucket_elems: elems,
            next_block: data_start + data.len() as u64,
        };

        let mut bytes = header.encode();
        bytes.resize(dir as usize, 0);
        bytes.extend(encode_directory(&directory, layout));
        bytes.resize(first_bucket as usize, 0);
        for bucket in &buckets {
            bytes.extend(bucket.encode(layout, bucket_size));
        }
        bytes.extend(data);

        let records = placed
            .iter()
            .flatten()
            .flatten()
            .map(|&index| self.records[index].clone())
            .collect();
        Ok(GdbmImage { bytes, records })
    }

    fn resolve_magic(&self) -> Result<Magic, FixtureError> {
        let width = self.layout.width;
        let magic = self.magic.unwrap_or(match width {
            OffsetWidth::Four => Magic::Offset32,
            OffsetWidth::Eight => Magic::Offset64,
        });
        match magic.offset_width() {
            Some(fixed) if fixed != width => Err(FixtureError::Geometry(format!(
                "{magic:?} requires {fixed:?} offsets"
            ))),
            _ => Ok(magic),
        }
    }

    fn check_geometry(&self) -> Result<(), FixtureError> {
        if self.dir_bits > HASH_BITS {
            return Err(FixtureError::Geometry(format!(
                "dir_bits {} exceeds {HASH_BITS}",
                self.dir_bits
            )));
        }
        if self.bucket_bits > self.dir_bits {
            return Err(FixtureError::Geometry(format!(
                "bucket_bits {} exceeds dir_bits {}",
                self.bucket_bits, self.dir_bits
            )));
        }
        if (self.block_size as usize) < self.layout.header_len() {
            return Err(FixtureError::Geometry(format!(
                "block_size {} smaller than the header",
                self.block_size
            )));
        }
        if self.bucket_elems == Some(0) {
            return Err(FixtureError::Geometry("bucket_elems is zero".to_string()));
        }
        Ok(())
    }
}

fn round_up(value: u64, block: u64) -> u64 {
    value.div_ceil(block) * block
}
