//! Property-based test generators using proptest.

use dbreader_format::{ByteOrder, Layout, OffsetWidth};
use proptest::prelude::*;

/// Records per generated database. One default bucket holds at least 16.
pub const MAX_GENERATED_RECORDS: usize = 12;

/// Arbitrary key or value bytes, including separators.
pub fn any_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Bytes free of NUL, tab and newline.
pub fn clean_bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        any::<u8>().prop_filter("separator byte", |b| !matches!(b, 0 | b'\t' | b'\n')),
        0..64,
    )
}

/// Records with distinct keys and arbitrary bytes.
pub fn records_strategy() -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::btree_map(any_bytes_strategy(), any_bytes_strategy(), 0..MAX_GENERATED_RECORDS)
        .prop_map(|map| map.into_iter().collect())
}

/// Records with distinct keys and no separator bytes.
pub fn clean_records_strategy() -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>)>> {
    prop::collection::btree_map(
        clean_bytes_strategy(),
        clean_bytes_strategy(),
        0..MAX_GENERATED_RECORDS,
    )
    .prop_map(|map| map.into_iter().collect())
}

/// Any supported byte order and offset width.
pub fn layout_strategy() -> impl Strategy<Value = Layout> {
    (
        prop_oneof![Just(ByteOrder::Little), Just(ByteOrder::Big)],
        prop_oneof![Just(OffsetWidth::Four), Just(OffsetWidth::Eight)],
    )
        .prop_map(|(order, width)| Layout::new(order, width))
}
