//! TSV record output.

use std::io::{self, Write};

/// Field separator.
pub const FIELD_SEPARATOR: u8 = b'\t';

/// Record separator.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Writes `key`, TAB, `value`, LF as raw bytes.
///
/// # Errors
///
/// Returns the first error from `out`.
pub fn emit_record<W: Write + ?Sized>(out: &mut W, key: &[u8], value: &[u8]) -> io::Result<()> {
    out.write_all(key)?;
    out.write_all(&[FIELD_SEPARATOR])?;
    out.write_all(value)?;
    out.write_all(&[RECORD_SEPARATOR])
}

/// Splits one output line (without its LF) at the first TAB.
#[must_use]
pub fn split_line(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let tab = line.iter().position(|&b| b == FIELD_SEPARATOR)?;
    Some((&line[..tab], &line[tab + 1..]))
}
