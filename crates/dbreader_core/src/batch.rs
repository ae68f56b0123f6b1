//! Per-file export over a list of inputs.
//!
//! Each input `x` is exported to `x<suffix>`. The store handle and output
//! file are scoped to one iteration of the loop and dropped before the next
//! input is opened, whichever way the iteration ends.

use crate::config::{ExportConfig, SkipPolicy, WriteFailurePolicy};
use crate::error::{CoreError, CoreResult};
use crate::store::{KeyValueStore, StoreOpener};
use crate::walker::{walk, WalkReport};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Appends `suffix` to `input`, keeping any existing extension.
#[must_use]
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// What happened to one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The walk finished.
    Exported(WalkReport),
    /// The walk started and failed.
    Failed {
        /// Error description.
        reason: String,
    },
    /// The input or its output could not be opened.
    Skipped {
        /// Error description.
        reason: String,
    },
}

/// Result for one input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// The input path as given.
    pub input: PathBuf,
    /// The derived output path.
    pub output: PathBuf,
    /// What happened.
    pub outcome: FileOutcome,
}

/// Accumulated results of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    files: Vec<FileReport>,
    skips: SkipPolicy,
}

impl BatchReport {
    /// Creates an empty report judged under `skips`.
    #[must_use]
    pub fn new(skips: SkipPolicy) -> Self {
        Self {
            files: Vec::new(),
            skips,
        }
    }

    /// Returns the report with `file` appended.
    #[must_use]
    pub fn with(mut self, file: FileReport) -> Self {
        self.files.push(file);
        self
    }

    /// Per-file results in input order.
    #[must_use]
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    /// Number of inputs exported.
    #[must_use]
    pub fn exported(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Exported(_)))
    }

    /// Number of inputs whose walk failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed { .. }))
    }

    /// Number of inputs skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped { .. }))
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|file| predicate(&file.outcome)).count()
    }

    /// Whether every walk succeeded, and no input was skipped under
    /// [`SkipPolicy::Fail`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && (self.skips == SkipPolicy::Tolerate || self.skipped() == 0)
    }

    /// Process exit status for this batch.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Runs exports for a list of inputs.
///
/// `notices` receives the per-file `Input :`/`Output :`/`Skipping` lines,
/// `diagnostics` the separator byte reports.
pub struct BatchDriver<O, N, D> {
    opener: O,
    config: ExportConfig,
    notices: N,
    diagnostics: D,
}

impl<O, N, D> BatchDriver<O, N, D>
where
    O: StoreOpener,
    N: Write,
    D: Write,
{
    /// Creates a driver.
    pub fn new(opener: O, config: ExportConfig, notices: N, diagnostics: D) -> Self {
        Self {
            opener,
            config,
            notices,
            diagnostics,
        }
    }

    /// Exports every input in order.
    pub fn run<P: AsRef<Path>>(&mut self, inputs: &[P]) -> BatchReport {
        let report = inputs
            .iter()
            .fold(BatchReport::new(self.config.skips), |report, input| {
                report.with(self.process_file(input.as_ref()))
            });
        let _ = self.notices.flush();
        let _ = self.diagnostics.flush();

        info!(
            exported = report.exported(),
            failed = report.failed(),
            skipped = report.skipped(),
            "batch finished"
        );
        report
    }

    /// Exports one input.
    pub fn process_file(&mut self, input: &Path) -> FileReport {
        let output = output_path(input, &self.config.suffix);
        let _ = writeln!(self.notices, "Input : {}", input.display());
        let _ = writeln!(self.notices, "Output : {}", output.display());

        let outcome = match self.open_pair(input, &output) {
            Ok((mut store, mut out)) => match export_store(
                &mut store,
                &mut out,
                &mut self.diagnostics,
                &self.config,
            ) {
                Ok(report) => {
                    info!(input = %input.display(), records = report.records, "exported");
                    FileOutcome::Exported(report)
                }
                Err(err) => {
                    warn!(input = %input.display(), error = %err, "export failed");
                    FileOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            },
            Err(err) => {
                let _ = writeln!(self.notices, "Skipping {}", input.display());
                warn!(input = %input.display(), error = %err, "skipped");
                FileOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
        };

        FileReport {
            input: input.to_path_buf(),
            output,
            outcome,
        }
    }

    /// Opens the store, then (only if that worked) the output file.
    fn open_pair(
        &self,
        input: &Path,
        output: &Path,
    ) -> CoreResult<(O::Store, BufWriter<File>)> {
        let store = self.opener.open_read_only(input)?;
        debug!(input = %input.display(), "opened store");
        if same_file(input, output) {
            return Err(CoreError::OutputIsInput {
                path: output.to_path_buf(),
            });
        }
        let out = File::create(output)?;
        Ok((store, BufWriter::new(out)))
    }
}

/// Whether `output` names `input`, literally or after resolving links.
fn same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

/// Exports one already-open store to `out` with the walker, flushing at
/// the end.
///
/// # Errors
///
/// See [`walk`]. A failed flush is an error only under
/// [`WriteFailurePolicy::Abort`].
pub fn export_store<S, W>(
    store: &mut S,
    out: &mut W,
    diagnostics: &mut dyn Write,
    config: &ExportConfig,
) -> CoreResult<WalkReport>
where
    S: KeyValueStore + ?Sized,
    W: Write + ?Sized,
{
    let mut report = walk(store, out, diagnostics, config)?;
    if let Err(err) = out.flush() {
        match config.write_failures {
            WriteFailurePolicy::Abort => return Err(CoreError::OutputWrite(err)),
            WriteFailurePolicy::Ignore => {
                warn!(error = %err, "flushing output failed, continuing");
                report.write_errors += 1;
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdbm::GdbmOpener;
    use crate::store::{MemoryOpener, MemoryStore};
    use dbreader_storage::LockMode;
    use dbreader_testkit::{tsv_bytes, GdbmImageBuilder, TempWorkspace};
    use std::io;

    fn driver(opener: MemoryOpener, config: ExportConfig) -> BatchDriver<MemoryOpener, Vec<u8>, Vec<u8>> {
        BatchDriver::new(opener, config, Vec::new(), Vec::new())
    }

    #[test]
    fn output_path_appends_suffix() {
        assert_eq!(
            output_path(Path::new("/data/users.db"), ".tsv"),
            PathBuf::from("/data/users.db.tsv")
        );
        assert_eq!(
            output_path(Path::new("plain"), ".out"),
            PathBuf::from("plain.out")
        );
    }

    #[test]
    fn exports_memory_store_and_prints_notices() {
        let workspace = TempWorkspace::new();
        let input = workspace.path().join("b.db");
        let store: MemoryStore = [("x", "y")].into_iter().collect();
        let mut driver = driver(
            MemoryOpener::new().with_store(&input, store),
            ExportConfig::default(),
        );

        let report = driver.run(&[&input]);
        assert!(report.is_success());
        assert_eq!(report.exported(), 1);
        assert_eq!(fs::read(output_path(&input, ".tsv")).unwrap(), b"x\ty\n");

        let notices = String::from_utf8(driver.notices.clone()).unwrap();
        assert_eq!(
            notices,
            format!(
                "Input : {}\nOutput : {}.tsv\n",
                input.display(),
                input.display()
            )
        );
    }

    #[test]
    fn missing_input_is_skipped_without_output() {
        let workspace = TempWorkspace::new();
        let missing = workspace.path().join("a.db");
        let present = workspace.path().join("b.db");
        let store: MemoryStore = [("x", "y")].into_iter().collect();
        let mut driver = driver(
            MemoryOpener::new().with_store(&present, store),
            ExportConfig::default(),
        );

        let report = driver.run(&[&missing, &present]);

        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.skipped(), 1);
        assert!(!output_path(&missing, ".tsv").exists());
        assert_eq!(fs::read(output_path(&present, ".tsv")).unwrap(), b"x\ty\n");

        let notices = String::from_utf8(driver.notices.clone()).unwrap();
        assert!(notices.contains(&format!("Skipping {}\n", missing.display())));
    }

    #[test]
    fn skips_fail_the_batch_when_configured() {
        let workspace = TempWorkspace::new();
        let mut driver = driver(
            MemoryOpener::new(),
            ExportConfig::new().skips(SkipPolicy::Fail),
        );

        let report = driver.run(&[workspace.path().join("a.db")]);
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn uncreatable_output_is_a_skip() {
        let workspace = TempWorkspace::new();
        let input = workspace.path().join("in.db");
        let mut driver = driver(
            MemoryOpener::new().with_store(&input, MemoryStore::new()),
            ExportConfig::new().suffix("/nested/out.tsv"),
        );

        let report = driver.run(&[&input]);
        assert_eq!(report.skipped(), 1);
        assert!(matches!(
            report.files()[0].outcome,
            FileOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn empty_store_gives_empty_output() {
        let workspace = TempWorkspace::new();
        let input = workspace.path().join("empty.db");
        let mut driver = driver(
            MemoryOpener::new().with_store(&input, MemoryStore::new()),
            ExportConfig::default(),
        );

        assert!(driver.run(&[&input]).is_success());
        let output = output_path(&input, ".tsv");
        assert!(output.exists());
        assert!(fs::read(output).unwrap().is_empty());
    }

    #[test]
    fn existing_output_is_truncated() {
        let workspace = TempWorkspace::new();
        let input = workspace.path().join("db");
        workspace.write_raw("db.tsv", b"stale contents that are longer\n");
        let store: MemoryStore = [("k", "v")].into_iter().collect();
        let mut driver = driver(
            MemoryOpener::new().with_store(&input, store),
            ExportConfig::default(),
        );

        driver.run(&[&input]);
        assert_eq!(fs::read(output_path(&input, ".tsv")).unwrap(), b"k\tv\n");
    }

    #[test]
    fn diagnostics_go_to_their_own_stream() {
        let workspace = TempWorkspace::new();
        let input = workspace.path().join("tabs.db");
        let store: MemoryStore = [("a\tb", "c")].into_iter().collect();
        let mut driver = driver(
            MemoryOpener::new().with_store(&input, store),
            ExportConfig::default(),
        );

        let report = driver.run(&[&input]);
        assert_eq!(
            report.files()[0].outcome,
            FileOutcome::Exported(WalkReport {
                records: 1,
                flagged_bytes: 1,
                write_errors: 0,
            })
        );
        assert_eq!(
            driver.diagnostics,
            b"Unexpected Character:Found tab character\n"
        );
        assert!(!String::from_utf8_lossy(&driver.notices).contains("Unexpected"));
    }

    #[test]
    fn corrupt_gdbm_file_fails_the_batch() {
        let workspace = TempWorkspace::new();
        let image = GdbmImageBuilder::new()
            .record("key", "a value that will be cut short")
            .build();
        let mut bytes = image.bytes;
        bytes.truncate(bytes.len() - 10);
        let input = workspace.write_raw("cut.db", &bytes);

        let mut driver = BatchDriver::new(
            GdbmOpener::new(LockMode::Shared),
            ExportConfig::default(),
            io::sink(),
            io::sink(),
        );
        let report = driver.run(&[&input]);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn gdbm_files_export_in_argument_order() {
        let workspace = TempWorkspace::new();
        let first = GdbmImageBuilder::new().record("one", "1").build();
        let second = GdbmImageBuilder::new()
            .records([("two", "2"), ("three", "3")])
            .build();
        let first_path = workspace.write_db("first.db", &first);
        let second_path = workspace.write_db("second.db", &second);
        let not_gdbm = workspace.write_raw("text.db", b"plain text, not a database");

        let mut driver = BatchDriver::new(
            GdbmOpener::default(),
            ExportConfig::default(),
            Vec::new(),
            io::sink(),
        );
        let report = driver.run(&[&first_path, &not_gdbm, &second_path]);

        assert!(report.is_success());
        assert_eq!(report.exported(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            workspace.read(&output_path(&second_path, ".tsv")),
            tsv_bytes(&second.store_order())
        );
        assert!(!output_path(&not_gdbm, ".tsv").exists());

        let inputs: Vec<&Path> = report.files().iter().map(|f| f.input.as_path()).collect();
        assert_eq!(inputs, vec![first_path.as_path(), not_gdbm.as_path(), second_path.as_path()]);
    }

    #[test]
    fn export_store_flushes() {
        let mut store: MemoryStore = [("k", "v")].into_iter().collect();
        let mut out = BufWriter::new(Vec::new());
        let report = export_store(&mut store, &mut out, &mut io::sink(), &ExportConfig::default()).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(out.buffer().len(), 0);
        assert_eq!(out.get_ref(), b"k\tv\n");
    }

    #[test]
    fn empty_suffix_leaves_the_input_untouched() {
        let workspace = TempWorkspace::new();
        let image = GdbmImageBuilder::new().record("key", "value").build();
        let input = workspace.write_db("victim.db", &image);

        let mut driver = BatchDriver::new(
            GdbmOpener::default(),
            ExportConfig::new().suffix(""),
            Vec::new(),
            io::sink(),
        );
        let report = driver.run(&[&input]);

        assert_eq!(workspace.read(&input), image.bytes);
        assert_eq!(report.skipped(), 1);
        match &report.files()[0].outcome {
            FileOutcome::Skipped { reason } => assert!(reason.contains("is the input file")),
            other => panic!("expected a skip, got {other:?}"),
        }
        let notices = String::from_utf8(driver.notices.clone()).unwrap();
        assert!(notices.contains(&format!("Skipping {}\n", input.display())));
    }

    #[cfg(unix)]
    #[test]
    fn output_linked_to_the_input_is_refused() {
        let workspace = TempWorkspace::new();
        let image = GdbmImageBuilder::new().record("key", "value").build();
        let input = workspace.write_db("users.db", &image);
        let output = output_path(&input, ".tsv");
        std::os::unix::fs::symlink(&input, &output).unwrap();

        let mut driver = BatchDriver::new(
            GdbmOpener::default(),
            ExportConfig::default(),
            io::sink(),
            io::sink(),
        );
        let report = driver.run(&[&input]);

        assert_eq!(report.skipped(), 1);
        assert_eq!(workspace.read(&input), image.bytes);
    }

    #[derive(Default)]
    struct FailingFlush {
        written: Vec<u8>,
    }

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "device full"))
        }
    }

    #[test]
    fn failed_final_flush_is_counted_when_ignoring_write_errors() {
        let mut store: MemoryStore = [("k", "v")].into_iter().collect();
        let mut out = FailingFlush::default();
        let config = ExportConfig::new().write_failures(WriteFailurePolicy::Ignore);

        let report = export_store(&mut store, &mut out, &mut io::sink(), &config).unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.write_errors, 1);
        assert_eq!(out.written, b"k\tv\n");
    }

    #[test]
    fn failed_final_flush_aborts_when_configured() {
        let mut store: MemoryStore = [("k", "v")].into_iter().collect();
        let mut out = FailingFlush::default();
        let config = ExportConfig::new().write_failures(WriteFailurePolicy::Abort);

        let result = export_store(&mut store, &mut out, &mut io::sink(), &config);
        assert!(matches!(result, Err(CoreError::OutputWrite(_))));
    }
}
