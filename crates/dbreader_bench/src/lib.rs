//! Benchmark utilities.

use dbreader_testkit::{GdbmImage, GdbmImageBuilder};

/// Slots per bucket in benchmark images.
pub const BUCKET_ELEMS: u32 = 64;

/// Deterministic payload of `size` bytes free of separator bytes.
#[must_use]
pub fn payload(seed: usize, size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| b'a' + ((seed.wrapping_mul(31) + i) % 26) as u8)
        .collect()
}

/// Directory depth that keeps buckets under a third full.
#[must_use]
pub fn depth_for(records: usize) -> u32 {
    let buckets = (records * 3).div_ceil(BUCKET_ELEMS as usize).max(1);
    buckets.next_power_of_two().trailing_zeros()
}

/// A GDBM image with `records` records of `value_len`-byte values.
#[must_use]
pub fn sample_image(records: usize, value_len: usize) -> GdbmImage {
    let bits = depth_for(records);
    GdbmImageBuilder::new()
        .dir_bits(bits)
        .bucket_bits(bits)
        .bucket_elems(BUCKET_ELEMS)
        .records((0..records).map(|i| (format!("key-{i:08}"), payload(i, value_len))))
        .build()
}
