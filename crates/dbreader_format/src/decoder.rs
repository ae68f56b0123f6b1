//! Sequential field decoder for GDBM structures.

use crate::error::{FormatError, FormatResult};
use crate::layout::{ByteOrder, Layout, OffsetWidth};
use bytes::Buf;

/// Reads C struct fields in a given [`Layout`].
///
/// Fields are consumed front to back. Offsets are zero-extended to `u64`
/// regardless of their on-disk width.
pub struct FieldDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    layout: Layout,
}

impl<'a> FieldDecoder<'a> {
    /// Create a decoder over `data`.
    pub fn new(data: &'a [u8], layout: Layout) -> Self {
        Self {
            data,
            pos: 0,
            layout,
        }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    fn take(&mut self, len: usize) -> FormatResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(FormatError::UnexpectedEof {
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a C `int`.
    pub fn read_i32(&mut self) -> FormatResult<i32> {
        let mut bytes = self.take(4)?;
        Ok(match self.layout.order {
            ByteOrder::Little => bytes.get_i32_le(),
            ByteOrder::Big => bytes.get_i32(),
        })
    }

    /// Read an `off_t`.
    pub fn read_offset(&mut self) -> FormatResult<u64> {
        let mut bytes = self.take(self.layout.offset_len())?;
        Ok(match (self.layout.width, self.layout.order) {
            (OffsetWidth::Four, ByteOrder::Little) => u64::from(bytes.get_u32_le()),
            (OffsetWidth::Four, ByteOrder::Big) => u64::from(bytes.get_u32()),
            (OffsetWidth::Eight, ByteOrder::Little) => bytes.get_u64_le(),
            (OffsetWidth::Eight, ByteOrder::Big) => bytes.get_u64(),
        })
    }

    /// Read `N` raw bytes.
    pub fn read_array<const N: usize>(&mut self) -> FormatResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Skip `len` bytes.
    pub fn skip(&mut self, len: usize) -> FormatResult<()> {
        self.take(len).map(|_| ())
    }

    /// Skip padding up to the next offset-aligned position.
    pub fn align_to_offset(&mut self) -> FormatResult<()> {
        let align = self.layout.offset_len();
        let pad = (align - self.pos % align) % align;
        self.skip(pad)
    }
}
