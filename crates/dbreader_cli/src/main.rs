//! dbreader CLI
//!
//! Exports GDBM database files to tab-separated text.
//!
//! ```text
//! dbreader file1.db file2.db ...
//! ```
//!
//! Each `fileN.db` is written to `fileN.db.tsv`, one `key<TAB>value` line
//! per record. The exit status is 0 if every file was exported.

mod commands;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use dbreader_core::{
    ExportConfig, LockMode, SkipPolicy, ValidationMode, WriteFailurePolicy, DEFAULT_SUFFIX,
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Export GDBM files to TSV.
#[derive(Parser)]
#[command(name = "dbreader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// GDBM files to export
    files: Vec<PathBuf>,

    /// Suffix appended to each input path to name its output
    #[arg(long, default_value = DEFAULT_SUFFIX, value_parser = NonEmptyStringValueParser::new())]
    suffix: String,

    /// Do not report NUL, tab and newline bytes in keys and values
    #[arg(long)]
    no_validate: bool,

    /// Fail a file on the first output write error
    #[arg(long)]
    strict_writes: bool,

    /// Count files that cannot be opened as failures
    #[arg(long)]
    fail_on_skip: bool,

    /// Do not take a shared lock on input files
    #[arg(long)]
    no_lock: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn export_config(&self) -> ExportConfig {
        ExportConfig::new()
            .suffix(self.suffix.as_str())
            .validation(if self.no_validate {
                ValidationMode::Off
            } else {
                ValidationMode::Warn
            })
            .write_failures(if self.strict_writes {
                WriteFailurePolicy::Abort
            } else {
                WriteFailurePolicy::Ignore
            })
            .skips(if self.fail_on_skip {
                SkipPolicy::Fail
            } else {
                SkipPolicy::Tolerate
            })
            .lock_mode(if self.no_lock {
                LockMode::None
            } else {
                LockMode::Shared
            })
    }
}

fn usage() -> String {
    let program = env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dbreader".to_string());
    format!("Usage: {program} file1.db file2.db ....\n Creates file1.db.tsv file2.db.tsv etc")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for notices
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.files.is_empty() {
        println!("{}", usage());
        return ExitCode::FAILURE;
    }

    let report = commands::export::run(&cli.files, cli.export_config());
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historical_behaviour() {
        let cli = Cli::parse_from(["dbreader", "a.db"]);
        let config = cli.export_config();
        assert_eq!(cli.files, vec![PathBuf::from("a.db")]);
        assert_eq!(config.suffix, ".tsv");
        assert_eq!(config.validation, ValidationMode::Warn);
        assert_eq!(config.write_failures, WriteFailurePolicy::Ignore);
        assert_eq!(config.skips, SkipPolicy::Tolerate);
        assert_eq!(config.lock_mode, LockMode::Shared);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "dbreader",
            "--suffix",
            ".txt",
            "--no-validate",
            "--strict-writes",
            "--fail-on-skip",
            "--no-lock",
            "a.db",
            "b.db",
        ]);
        let config = cli.export_config();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(config.suffix, ".txt");
        assert_eq!(config.validation, ValidationMode::Off);
        assert_eq!(config.write_failures, WriteFailurePolicy::Abort);
        assert_eq!(config.skips, SkipPolicy::Fail);
        assert_eq!(config.lock_mode, LockMode::None);
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let err = Cli::try_parse_from(["dbreader", "--suffix", "", "a.db"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn hyphenated_paths_follow_double_dash() {
        let cli = Cli::parse_from(["dbreader", "--", "-odd.db"]);
        assert_eq!(cli.files, vec![PathBuf::from("-odd.db")]);
    }

    #[test]
    fn no_files_parses() {
        let cli = Cli::parse_from(["dbreader"]);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn usage_names_outputs() {
        assert!(usage().contains("file1.db file2.db ....\n Creates file1.db.tsv file2.db.tsv etc"));
    }
}
