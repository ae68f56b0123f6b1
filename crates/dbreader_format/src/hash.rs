//! The GDBM key hash and the probe positions derived from it.

use crate::layout::HASH_BITS;

const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Compute the 31-bit GDBM hash of a key.
///
/// Key bytes are sign-extended before shifting, as the C implementation
/// reads them through a plain `char` pointer on the hosts that produced
/// these files.
#[must_use]
pub fn hash(key: &[u8]) -> u32 {
    let mut value = 0x238F_13AFu32.wrapping_mul(key.len() as u32);
    for (index, &byte) in key.iter().enumerate() {
        let extended = i32::from(byte as i8) as u32;
        let shift = (index * 5 % 24) as u32;
        value = value.wrapping_add(extended.wrapping_shl(shift)) & HASH_MASK;
    }
    1_103_515_243u32.wrapping_mul(value).wrapping_add(12345) & HASH_MASK
}

/// Directory entry selected by `hash` in a directory of `dir_bits` bits.
#[must_use]
pub fn dir_index(hash: u32, dir_bits: u32) -> usize {
    (hash >> (HASH_BITS - dir_bits)) as usize
}

/// Home slot of `hash` in a bucket of `bucket_elems` slots.
#[must_use]
pub fn home_slot(hash: u32, bucket_elems: u32) -> usize {
    (hash % bucket_elems) as usize
}
