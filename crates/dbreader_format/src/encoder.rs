//! Sequential field encoder for GDBM structures.
//!
//! The exporter never writes databases; the encoder exists so test
//! fixtures can produce byte-exact images in every supported layout.

use crate::layout::{ByteOrder, Layout, OffsetWidth};
use bytes::BufMut;

/// Writes C struct fields in a given [`Layout`].
pub struct FieldEncoder {
    buf: Vec<u8>,
    layout: Layout,
}

impl FieldEncoder {
    /// Create an empty encoder.
    pub fn new(layout: Layout) -> Self {
        Self {
            buf: Vec::new(),
            layout,
        }
    }

    /// Write a C `int`.
    pub fn put_i32(&mut self, value: i32) {
        match self.layout.order {
            ByteOrder::Little => self.buf.put_i32_le(value),
            ByteOrder::Big => self.buf.put_i32(value),
        }
    }

    /// Write an `off_t`, truncating to the layout width.
    pub fn put_offset(&mut self, value: u64) {
        match (self.layout.width, self.layout.order) {
            (OffsetWidth::Four, ByteOrder::Little) => self.buf.put_u32_le(value as u32),
            (OffsetWidth::Four, ByteOrder::Big) => self.buf.put_u32(value as u32),
            (OffsetWidth::Eight, ByteOrder::Little) => self.buf.put_u64_le(value),
            (OffsetWidth::Eight, ByteOrder::Big) => self.buf.put_u64(value),
        }
    }

    /// Write raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Write `len` zero bytes.
    pub fn put_zeros(&mut self, len: usize) {
        self.buf.put_bytes(0, len);
    }

    /// Pad with zeros to the next offset-aligned position.
    pub fn align_to_offset(&mut self) {
        let align = self.layout.offset_len();
        let pad = (align - self.buf.len() % align) % align;
        self.put_zeros(pad);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the encoder and return its bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
