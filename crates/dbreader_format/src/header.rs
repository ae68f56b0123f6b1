//! GDBM file header.

use crate::decoder::FieldDecoder;
use crate::encoder::FieldEncoder;
use crate::error::{FormatError, FormatResult};
use crate::layout::{ByteOrder, Layout, OffsetWidth, HASH_BITS};

/// Bytes to read from the start of a file to decode any header.
pub const MAX_HEADER_LEN: usize = 40;

/// GDBM magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magic {
    /// Original magic; offset width is whatever the writing host used.
    Original,
    /// Standard header with 32-bit offsets.
    Offset32,
    /// Standard header with 64-bit offsets.
    Offset64,
    /// Extended (numsync) header with 32-bit offsets.
    Numsync32,
    /// Extended (numsync) header with 64-bit offsets.
    Numsync64,
}

impl Magic {
    const ALL: [Magic; 5] = [
        Magic::Original,
        Magic::Offset32,
        Magic::Offset64,
        Magic::Numsync32,
        Magic::Numsync64,
    ];

    /// The on-disk value.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Original => 0x1357_9ace,
            Self::Offset32 => 0x1357_9acd,
            Self::Offset64 => 0x1357_9acf,
            Self::Numsync32 => 0x1357_9ad0,
            Self::Numsync64 => 0x1357_9ad1,
        }
    }

    /// Look up a magic by value.
    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|magic| magic.value() == value)
    }

    /// Offset width fixed by this magic, if any.
    #[must_use]
    pub const fn offset_width(self) -> Option<OffsetWidth> {
        match self {
            Self::Original => None,
            Self::Offset32 | Self::Numsync32 => Some(OffsetWidth::Four),
            Self::Offset64 | Self::Numsync64 => Some(OffsetWidth::Eight),
        }
    }
}

/// The fixed part of a GDBM file header.
///
/// The avail block that follows it on disk is not needed for reading and
/// is not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic number found at offset 0.
    pub magic: Magic,
    /// Byte order and offset width of the file.
    pub layout: Layout,
    /// Allocation block size.
    pub block_size: u32,
    /// File address of the hash directory.
    pub dir: u64,
    /// Size of the hash directory in bytes.
    pub dir_size: u32,
    /// Number of hash bits used to index the directory.
    pub dir_bits: u32,
    /// Size of a bucket on disk.
    pub bucket_size: u32,
    /// Number of element slots per bucket.
    pub bucket_elems: u32,
    /// Next unallocated file address.
    pub next_block: u64,
}

impl FileHeader {
    /// Decode a header from the start of a file.
    ///
    /// Byte order is detected from the magic. For [`Magic::Original`] the
    /// offset width is the one under which the directory size agrees with
    /// the directory depth.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::BadMagic`] for non-GDBM data and
    /// [`FormatError::InvalidHeader`] for negative or inconsistent fields.
    pub fn decode(buf: &[u8]) -> FormatResult<Self> {
        let (magic, order) = detect_magic(buf)?;

        match magic.offset_width() {
            Some(width) => Self::decode_with(buf, magic, Layout::new(order, width)),
            None => [OffsetWidth::Eight, OffsetWidth::Four]
                .into_iter()
                .filter_map(|width| Self::decode_with(buf, magic, Layout::new(order, width)).ok())
                .find(Self::directory_size_agrees)
                .ok_or_else(|| {
                    FormatError::invalid_header("cannot infer offset width from directory size")
                }),
        }
    }

    fn decode_with(buf: &[u8], magic: Magic, layout: Layout) -> FormatResult<Self> {
        let mut decoder = FieldDecoder::new(buf, layout);
        decoder.skip(4)?;
        let block_size = non_negative(decoder.read_i32()?, "block_size")?;
        let dir = decoder.read_offset()?;
        let dir_size = non_negative(decoder.read_i32()?, "dir_size")?;
        let dir_bits = non_negative(decoder.read_i32()?, "dir_bits")?;
        let bucket_size = non_negative(decoder.read_i32()?, "bucket_size")?;
        let bucket_elems = non_negative(decoder.read_i32()?, "bucket_elems")?;
        let next_block = decoder.read_offset()?;

        if dir_bits > HASH_BITS {
            return Err(FormatError::invalid_header(format!(
                "dir_bits {dir_bits} exceeds {HASH_BITS}"
            )));
        }

        Ok(Self {
            magic,
            layout,
            block_size,
            dir,
            dir_size,
            dir_bits,
            bucket_size,
            bucket_elems,
            next_block,
        })
    }

    /// Encode the fixed header fields.
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = FieldEncoder::new(self.layout);
        encoder.put_i32(self.magic.value() as i32);
        encoder.put_i32(self.block_size as i32);
        encoder.put_offset(self.dir);
        encoder.put_i32(self.dir_size as i32);
        encoder.put_i32(self.dir_bits as i32);
        encoder.put_i32(self.bucket_size as i32);
        encoder.put_i32(self.bucket_elems as i32);
        encoder.put_offset(self.next_block);
        encoder.finish()
    }

    /// Number of directory entries.
    #[must_use]
    pub fn dir_entries(&self) -> usize {
        1usize << self.dir_bits
    }

    fn directory_size_agrees(&self) -> bool {
        u64::from(self.dir_size) == (self.layout.offset_len() as u64) << self.dir_bits
    }

    /// Check the header against the size of the file it came from.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidHeader`] describing the first
    /// inconsistency found.
    pub fn validate(&self, file_size: u64) -> FormatResult<()> {
        if self.block_size == 0 {
            return Err(FormatError::invalid_header("block_size is zero"));
        }
        if self.bucket_elems == 0 {
            return Err(FormatError::invalid_header("bucket_elems is zero"));
        }
        if !self.directory_size_agrees() {
            return Err(FormatError::invalid_header(format!(
                "dir_size {} does not match dir_bits {}",
                self.dir_size, self.dir_bits
            )));
        }
        let dir_end = self.dir.saturating_add(u64::from(self.dir_size));
        if self.dir < self.layout.header_len() as u64 || dir_end > file_size {
            return Err(FormatError::invalid_header(format!(
                "directory [{}, {dir_end}) outside file of {file_size} bytes",
                self.dir
            )));
        }
        let needed = self.layout.bucket_len(self.bucket_elems as usize);
        if (self.bucket_size as usize) < needed {
            return Err(FormatError::invalid_header(format!(
                "bucket_size {} too small for {} elements ({needed} needed)",
                self.bucket_size, self.bucket_elems
            )));
        }
        Ok(())
    }
}

fn detect_magic(buf: &[u8]) -> FormatResult<(Magic, ByteOrder)> {
    let bytes: [u8; 4] = buf
        .get(..4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(FormatError::UnexpectedEof {
            needed: 4,
            available: buf.len(),
        })?;

    let little = u32::from_le_bytes(bytes);
    if let Some(magic) = Magic::from_value(little) {
        return Ok((magic, ByteOrder::Little));
    }
    if let Some(magic) = Magic::from_value(u32::from_be_bytes(bytes)) {
        return Ok((magic, ByteOrder::Big));
    }
    Err(FormatError::BadMagic { found: little })
}

fn non_negative(value: i32, field: &str) -> FormatResult<u32> {
    u32::try_from(value)
        .map_err(|_| FormatError::invalid_header(format!("{field} is negative ({value})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(magic: Magic, layout: Layout) -> FileHeader {
        FileHeader {
            magic,
            layout,
            block_size: 512,
            dir: 512,
            dir_size: (layout.offset_len() as u32) << 2,
            dir_bits: 2,
            bucket_size: 512,
            bucket_elems: 16,
            next_block: 4096,
        }
    }

    #[test]
    fn decodes_every_layout() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            for (magic, width) in [
                (Magic::Offset32, OffsetWidth::Four),
                (Magic::Offset64, OffsetWidth::Eight),
                (Magic::Numsync32, OffsetWidth::Four),
                (Magic::Numsync64, OffsetWidth::Eight),
            ] {
                let header = sample(magic, Layout::new(order, width));
                let decoded = FileHeader::decode(&header.encode()).unwrap();
                assert_eq!(decoded, header);
            }
        }
    }

    #[test]
    fn original_magic_infers_offset_width() {
        for width in [OffsetWidth::Four, OffsetWidth::Eight] {
            let header = sample(Magic::Original, Layout::new(ByteOrder::Little, width));
            let decoded = FileHeader::decode(&header.encode()).unwrap();
            assert_eq!(decoded.layout.width, width);
        }
    }

    #[test]
    fn unknown_magic_is_rejected() {
        let result = FileHeader::decode(b"NOPE and some more bytes to fill a header....");
        assert!(matches!(result, Err(FormatError::BadMagic { .. })));
    }

    #[test]
    fn truncated_header_is_eof() {
        let header = sample(Magic::Offset64, Layout::native64());
        let bytes = header.encode();
        let result = FileHeader::decode(&bytes[..20]);
        assert!(matches!(result, Err(FormatError::UnexpectedEof { .. })));
        assert!(matches!(
            FileHeader::decode(&bytes[..2]),
            Err(FormatError::UnexpectedEof { needed: 4, .. })
        ));
    }

    #[test]
    fn negative_field_is_rejected() {
        let mut header = sample(Magic::Offset64, Layout::native64());
        header.bucket_elems = u32::MAX;
        let result = FileHeader::decode(&header.encode());
        assert!(matches!(result, Err(FormatError::InvalidHeader { .. })));
    }

    #[test]
    fn validate_accepts_consistent_header() {
        let header = sample(Magic::Offset64, Layout::native64());
        assert!(header.validate(4096).is_ok());
    }

    #[test]
    fn validate_rejects_directory_past_end() {
        let header = sample(Magic::Offset64, Layout::native64());
        assert!(header.validate(520).is_err());
    }

    #[test]
    fn validate_rejects_mismatched_directory_size() {
        let mut header = sample(Magic::Offset64, Layout::native64());
        header.dir_size = 8;
        assert!(header.validate(4096).is_err());
    }

    #[test]
    fn validate_rejects_small_buckets() {
        let mut header = sample(Magic::Offset64, Layout::native64());
        header.bucket_size = 100;
        assert!(header.validate(4096).is_err());
    }

    #[test]
    fn validate_rejects_zero_bucket_elems() {
        let mut header = sample(Magic::Offset32, Layout::new(ByteOrder::Big, OffsetWidth::Four));
        header.bucket_elems = 0;
        assert!(header.validate(4096).is_err());
    }
}
