//! Byte order, offset width, and the struct sizes they imply.

/// Byte order of every integer in a GDBM file.
///
/// GDBM writes native integers, so the order is that of the host that
/// created the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian (x86, most ARM).
    Little,
    /// Big-endian (SPARC, POWER, s390x).
    Big,
}

/// Width of a file offset (`off_t`) in a GDBM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OffsetWidth {
    /// 32-bit offsets.
    Four,
    /// 64-bit offsets.
    Eight,
}

impl OffsetWidth {
    /// Size of one offset in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// Number of avail entries embedded in every bucket.
pub const BUCKET_AVAIL: usize = 6;

/// Number of leading key bytes cached in a bucket element.
pub const SMALL: usize = 4;

/// Number of significant bits in a GDBM hash value.
pub const HASH_BITS: u32 = 31;

/// Physical layout of a GDBM file: byte order plus offset width.
///
/// All struct sizes follow C alignment rules: an offset is aligned to its
/// own width, an `int` to four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Integer byte order.
    pub order: ByteOrder,
    /// Offset width.
    pub width: OffsetWidth,
}

impl Layout {
    /// Creates a layout.
    #[must_use]
    pub const fn new(order: ByteOrder, width: OffsetWidth) -> Self {
        Self { order, width }
    }

    /// Layout of a file written by a little-endian host with 64-bit offsets.
    #[must_use]
    pub const fn native64() -> Self {
        Self::new(ByteOrder::Little, OffsetWidth::Eight)
    }

    /// Size of an offset in bytes.
    #[must_use]
    pub const fn offset_len(self) -> usize {
        self.width.bytes()
    }

    /// Size of the fixed header fields, from the magic through `next_block`.
    #[must_use]
    pub const fn header_len(self) -> usize {
        // magic, block_size, dir, dir_size, dir_bits, bucket_size, bucket_elems, next_block
        4 * 6 + 2 * self.offset_len()
    }

    /// Size of one `{ int size; off_t addr; }` avail entry.
    #[must_use]
    pub const fn avail_elem_len(self) -> usize {
        match self.width {
            OffsetWidth::Four => 8,
            OffsetWidth::Eight => 16,
        }
    }

    /// Offset of the avail table inside a bucket.
    #[must_use]
    pub const fn bucket_avail_offset(self) -> usize {
        match self.width {
            OffsetWidth::Four => 4,
            OffsetWidth::Eight => 8,
        }
    }

    /// Offset of the element table inside a bucket.
    #[must_use]
    pub const fn bucket_table_offset(self) -> usize {
        // avail table, bucket_bits, count
        self.bucket_avail_offset() + BUCKET_AVAIL * self.avail_elem_len() + 8
    }

    /// Size of one bucket element.
    #[must_use]
    pub const fn element_len(self) -> usize {
        // hash_value, key_start, data_pointer, key_size, data_size
        4 + SMALL + self.offset_len() + 4 + 4
    }

    /// Minimum bucket size holding `elems` elements.
    #[must_use]
    pub const fn bucket_len(self, elems: usize) -> usize {
        self.bucket_table_offset() + elems * self.element_len()
    }
}
