//! # dbreader Format
//!
//! Decoding (and, for fixtures, encoding) of the GDBM on-disk format.
//!
//! A GDBM file is an extendible hash table:
//!
//! ```text
//! header  { magic, block_size, dir, dir_size, dir_bits, bucket_size, bucket_elems, next_block, avail... }
//! dir     [ bucket address; 2^dir_bits ]        adjacent entries may share a bucket
//! bucket  { av_count, avail[6], bucket_bits, count, slot[bucket_elems] }
//! slot    { hash | -1, key_start[4], data_pointer, key_size, data_size }
//! record  key bytes immediately followed by value bytes, at data_pointer
//! ```
//!
//! Integers are native to the host that wrote the file. This crate reads
//! both byte orders and both offset widths; see [`Layout`].
//!
//! ## Usage
//!
//! ```
//! use dbreader_format::{FileHeader, Layout, Magic};
//!
//! let layout = Layout::native64();
//! let header = FileHeader {
//!     magic: Magic::Offset64,
//!     layout,
//!     block_size: 512,
//!     dir: 512,
//!     dir_size: 8,
//!     dir_bits: 0,
//!     bucket_size: 512,
//!     bucket_elems: 16,
//!     next_block: 1536,
//! };
//! let decoded = FileHeader::decode(&header.encode()).unwrap();
//! assert_eq!(decoded, header);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bucket;
mod decoder;
mod encoder;
mod error;
mod hash;
mod header;
mod layout;

pub use bucket::{decode_directory, encode_directory, key_start, Bucket, BucketElement};
pub use decoder::FieldDecoder;
pub use encoder::FieldEncoder;
pub use error::{FormatError, FormatResult};
pub use hash::{dir_index, hash, home_slot};
pub use header::{FileHeader, Magic, MAX_HEADER_LEN};
pub use layout::{ByteOrder, Layout, OffsetWidth, BUCKET_AVAIL, HASH_BITS, SMALL};
