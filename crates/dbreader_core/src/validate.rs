//! Separator byte checks.
//!
//! Output lines use TAB between key and value and LF between records, so
//! either byte inside a key or value breaks the line structure. NUL is
//! flagged too since many readers treat it as a terminator.

use std::io::Write;

/// A byte class that corrupts TSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// `0x00`
    Nul,
    /// `0x09`
    Tab,
    /// `0x0A`
    Newline,
}

impl ByteClass {
    /// Classifies `byte`, or `None` if it is safe.
    #[must_use]
    pub const fn of(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Nul),
            b'\t' => Some(Self::Tab),
            b'\n' => Some(Self::Newline),
            _ => None,
        }
    }

    /// Human-readable description used in diagnostics.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Nul => "Found NUL character",
            Self::Tab => "Found tab character",
            Self::Newline => "Found newline character",
        }
    }
}

/// Writes one diagnostic line per separator byte in `bytes`.
///
/// Returns the number of bytes flagged. The buffer is left untouched and
/// failures to write a diagnostic are ignored.
pub fn check_characters(bytes: &[u8], diagnostics: &mut dyn Write) -> usize {
    let mut flagged = 0;
    for class in bytes.iter().filter_map(|&byte| ByteClass::of(byte)) {
        flagged += 1;
        let _ = writeln!(diagnostics, "Unexpected Character:{}", class.description());
    }
    flagged
}
