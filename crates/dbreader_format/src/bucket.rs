//! Hash directory and bucket structures.

use crate::decoder::FieldDecoder;
use crate::encoder::FieldEncoder;
use crate::error::{FormatError, FormatResult};
use crate::layout::{Layout, BUCKET_AVAIL, SMALL};

/// Decode `entries` bucket addresses from a directory block.
///
/// # Errors
///
/// Returns [`FormatError::UnexpectedEof`] if `buf` is too short.
pub fn decode_directory(buf: &[u8], layout: Layout, entries: usize) -> FormatResult<Vec<u64>> {
    let mut decoder = FieldDecoder::new(buf, layout);
    (0..entries).map(|_| decoder.read_offset()).collect()
}

/// Encode bucket addresses as a directory block.
pub fn encode_directory(addresses: &[u64], layout: Layout) -> Vec<u8> {
    let mut encoder = FieldEncoder::new(layout);
    for &address in addresses {
        encoder.put_offset(address);
    }
    encoder.finish()
}

/// One occupied slot of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketElement {
    /// Full 31-bit hash of the key.
    pub hash: u32,
    /// Up to the first [`SMALL`] bytes of the key.
    pub key_start: [u8; SMALL],
    /// File address of the key bytes; the value follows directly.
    pub data_pointer: u64,
    /// Key length in bytes.
    pub key_size: u32,
    /// Value length in bytes.
    pub data_size: u32,
}

impl BucketElement {
    /// Whether the cached key prefix and length agree with `key`.
    #[must_use]
    pub fn may_hold(&self, hash: u32, key: &[u8]) -> bool {
        let prefix = key.len().min(SMALL);
        self.hash == hash
            && self.key_size as usize == key.len()
            && self.key_start[..prefix] == key[..prefix]
    }
}

/// A hash bucket. Empty slots (hash `-1` on disk) are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Number of hash bits that select this bucket.
    pub bucket_bits: u32,
    /// Number of occupied slots as recorded on disk.
    pub count: u32,
    /// Element slots in on-disk order.
    pub slots: Vec<Option<BucketElement>>,
}

impl Bucket {
    /// Create a bucket with `elems` empty slots.
    #[must_use]
    pub fn empty(bucket_bits: u32, elems: usize) -> Self {
        Self {
            bucket_bits,
            count: 0,
            slots: vec![None; elems],
        }
    }

    /// Decode a bucket with `elems` slots.
    ///
    /// The embedded avail table is skipped. Occupied slots with negative
    /// sizes or hashes are rejected; empty slots are not inspected past
    /// their hash.
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` is short or a slot is malformed.
    pub fn decode(buf: &[u8], layout: Layout, elems: usize) -> FormatResult<Self> {
        let mut decoder = FieldDecoder::new(buf, layout);
        let _av_count = decoder.read_i32()?;
        decoder.align_to_offset()?;
        decoder.skip(BUCKET_AVAIL * layout.avail_elem_len())?;
        let bucket_bits = decoder.read_i32()?;
        let count = decoder.read_i32()?;

        let bucket_bits = u32::try_from(bucket_bits)
            .map_err(|_| FormatError::invalid_bucket(format!("bucket_bits is {bucket_bits}")))?;
        let count = u32::try_from(count)
            .map_err(|_| FormatError::invalid_bucket(format!("count is {count}")))?;

        let mut slots = Vec::with_capacity(elems);
        for index in 0..elems {
            let hash = decoder.read_i32()?;
            let key_start = decoder.read_array::<SMALL>()?;
            let data_pointer = decoder.read_offset()?;
            let key_size = decoder.read_i32()?;
            let data_size = decoder.read_i32()?;

            if hash == -1 {
                slots.push(None);
                continue;
            }

            let (Ok(hash), Ok(key_size), Ok(data_size)) = (
                u32::try_from(hash),
                u32::try_from(key_size),
                u32::try_from(data_size),
            ) else {
                return Err(FormatError::invalid_bucket(format!(
                    "slot {index} has hash {hash}, key_size {key_size}, data_size {data_size}"
                )));
            };

            slots.push(Some(BucketElement {
                hash,
                key_start,
                data_pointer,
                key_size,
                data_size,
            }));
        }

        Ok(Self {
            bucket_bits,
            count,
            slots,
        })
    }

    /// Encode the bucket, avail table zeroed, padded to `bucket_size`.
    pub fn encode(&self, layout: Layout, bucket_size: usize) -> Vec<u8> {
        let mut encoder = FieldEncoder::new(layout);
        encoder.put_i32(0);
        encoder.align_to_offset();
        encoder.put_zeros(BUCKET_AVAIL * layout.avail_elem_len());
        encoder.put_i32(self.bucket_bits as i32);
        encoder.put_i32(self.count as i32);

        for slot in &self.slots {
            match slot {
                Some(element) => {
                    encoder.put_i32(element.hash as i32);
                    encoder.put_bytes(&element.key_start);
                    encoder.put_offset(element.data_pointer);
                    encoder.put_i32(element.key_size as i32);
                    encoder.put_i32(element.data_size as i32);
                }
                None => {
                    encoder.put_i32(-1);
                    encoder.put_zeros(SMALL);
                    encoder.put_offset(0);
                    encoder.put_i32(0);
                    encoder.put_i32(0);
                }
            }
        }

        if encoder.len() < bucket_size {
            let pad = bucket_size - encoder.len();
            encoder.put_zeros(pad);
        }
        encoder.finish()
    }
}

/// The first [`SMALL`] bytes of a key, zero-filled.
#[must_use]
pub fn key_start(key: &[u8]) -> [u8; SMALL] {
    let mut start = [0u8; SMALL];
    let len = key.len().min(SMALL);
    start[..len].copy_from_slice(&key[..len]);
    start
}
