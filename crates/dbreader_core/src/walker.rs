//! Full-scan export of one store.

use crate::config::{ExportConfig, ValidationMode, WriteFailurePolicy};
use crate::emit::emit_record;
use crate::error::{CoreError, CoreResult};
use crate::store::KeyValueStore;
use crate::validate::check_characters;
use std::io::Write;
use tracing::{debug, warn};

/// Counters from one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Records visited and handed to the emitter.
    pub records: u64,
    /// Separator bytes reported by the validator.
    pub flagged_bytes: u64,
    /// Records whose output write failed.
    pub write_errors: u64,
}

/// Writes every record of `store` to `out` in store order.
///
/// Keys and values are checked for separator bytes first when validation
/// is enabled; findings go to `diagnostics` and the record is written
/// anyway.
///
/// # Errors
///
/// Returns an error if the store cannot be read, a key yields no value,
/// or (with [`WriteFailurePolicy::Abort`]) an output write fails.
pub fn walk<S, W>(
    store: &mut S,
    out: &mut W,
    diagnostics: &mut dyn Write,
    config: &ExportConfig,
) -> CoreResult<WalkReport>
where
    S: KeyValueStore + ?Sized,
    W: Write + ?Sized,
{
    let mut report = WalkReport::default();
    let mut current = store.first_key()?;

    while let Some(key) = current {
        let value = store
            .fetch(&key)?
            .ok_or_else(|| CoreError::missing_value(&key))?;

        if config.validation == ValidationMode::Warn {
            report.flagged_bytes += check_characters(&key, diagnostics) as u64;
            report.flagged_bytes += check_characters(&value, diagnostics) as u64;
        }

        report.records += 1;
        if let Err(err) = emit_record(out, &key, &value) {
            match config.write_failures {
                WriteFailurePolicy::Abort => return Err(CoreError::OutputWrite(err)),
                WriteFailurePolicy::Ignore => {
                    if report.write_errors == 0 {
                        warn!(error = %err, "output write failed, continuing");
                    }
                    report.write_errors += 1;
                }
            }
        }
        drop(value);

        current = store.next_key(&key)?;
    }

    debug!(
        records = report.records,
        flagged_bytes = report.flagged_bytes,
        write_errors = report.write_errors,
        "walk finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::split_line;
    use crate::gdbm::GdbmFile;
    use crate::store::MemoryStore;
    use dbreader_storage::InMemoryBackend;
    use dbreader_testkit::{clean_records_strategy, layout_strategy, tsv_bytes, GdbmImageBuilder};
    use proptest::prelude::*;
    use std::io;

    fn run(store: &mut impl KeyValueStore, config: &ExportConfig) -> (CoreResult<WalkReport>, Vec<u8>, String) {
        let mut out = Vec::new();
        let mut diagnostics = Vec::new();
        let result = walk(store, &mut out, &mut diagnostics, config);
        (result, out, String::from_utf8(diagnostics).unwrap())
    }

    #[test]
    fn empty_store_writes_nothing() {
        let (result, out, diagnostics) = run(&mut MemoryStore::new(), &ExportConfig::default());
        assert_eq!(result.unwrap(), WalkReport::default());
        assert!(out.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn records_are_written_in_store_order() {
        let mut store: MemoryStore = [("b", "2"), ("a", "1")].into_iter().collect();
        let (result, out, _) = run(&mut store, &ExportConfig::default());
        assert_eq!(result.unwrap().records, 2);
        assert_eq!(out, b"a\t1\nb\t2\n");
    }

    #[test]
    fn separators_are_reported_and_still_written() {
        let mut store: MemoryStore = [("k\t1", "line\nbreak")].into_iter().collect();
        let (result, out, diagnostics) = run(&mut store, &ExportConfig::default());

        assert_eq!(result.unwrap().flagged_bytes, 2);
        assert_eq!(out, b"k\t1\tline\nbreak\n");
        assert_eq!(
            diagnostics,
            "Unexpected Character:Found tab character\n\
             Unexpected Character:Found newline character\n"
        );
    }

    #[test]
    fn validation_off_is_silent() {
        let mut store: MemoryStore = [("\0", "\t")].into_iter().collect();
        let config = ExportConfig::new().validation(ValidationMode::Off);
        let (result, _, diagnostics) = run(&mut store, &config);
        assert_eq!(result.unwrap().flagged_bytes, 0);
        assert!(diagnostics.is_empty());
    }

    /// Accepts `limit` bytes, then fails every write.
    struct FullDisk {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let len = buf.len().min(room);
            self.written.extend_from_slice(&buf[..len]);
            Ok(len)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_counted_when_ignored() {
        let mut store: MemoryStore = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let mut out = FullDisk { written: Vec::new(), limit: 4 };
        let report = walk(&mut store, &mut out, &mut io::sink(), &ExportConfig::default()).unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(report.write_errors, 2);
        assert_eq!(out.written, b"a\t1\n");
    }

    #[test]
    fn write_failure_aborts_when_strict() {
        let mut store: MemoryStore = [("a", "1"), ("b", "2")].into_iter().collect();
        let mut out = FullDisk { written: Vec::new(), limit: 4 };
        let config = ExportConfig::new().write_failures(WriteFailurePolicy::Abort);
        let result = walk(&mut store, &mut out, &mut io::sink(), &config);

        assert!(matches!(result, Err(CoreError::OutputWrite(_))));
    }

    /// Hands out keys it cannot fetch.
    struct Vanishing;

    impl KeyValueStore for Vanishing {
        fn first_key(&mut self) -> CoreResult<Option<Vec<u8>>> {
            Ok(Some(b"ghost".to_vec()))
        }

        fn next_key(&mut self, _: &[u8]) -> CoreResult<Option<Vec<u8>>> {
            Ok(None)
        }

        fn fetch(&mut self, _: &[u8]) -> CoreResult<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    #[test]
    fn missing_value_fails_the_walk() {
        let (result, out, _) = run(&mut Vanishing, &ExportConfig::default());
        assert!(matches!(result, Err(CoreError::MissingValue { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn gdbm_file_exports_in_store_order() {
        let image = GdbmImageBuilder::new()
            .records([("alpha", "1"), ("beta", "2"), ("gamma", "3")])
            .build();
        let expected = tsv_bytes(&image.store_order());
        let mut db = GdbmFile::open(InMemoryBackend::with_data(image.bytes)).unwrap();

        let (result, out, _) = run(&mut db, &ExportConfig::default());
        assert_eq!(result.unwrap().records, 3);
        assert_eq!(out, expected);
    }

    proptest! {
        #[test]
        fn export_reconstructs_every_record(
            records in clean_records_strategy(),
            layout in layout_strategy(),
        ) {
            let image = GdbmImageBuilder::new()
                .layout(layout)
                .records(records.clone())
                .build();
            let mut db = GdbmFile::open(InMemoryBackend::with_data(image.bytes)).unwrap();

            let (result, out, diagnostics) = run(&mut db, &ExportConfig::default());
            prop_assert_eq!(result.unwrap().records, records.len() as u64);
            prop_assert!(diagnostics.is_empty());

            let mut exported: Vec<(Vec<u8>, Vec<u8>)> = out
                .split(|&b| b == b'\n')
                .filter(|line| !line.is_empty())
                .map(|line| {
                    let (k, v) = split_line(line).unwrap();
                    (k.to_vec(), v.to_vec())
                })
                .collect();
            exported.sort();
            prop_assert_eq!(exported, records);
        }
    }
}
