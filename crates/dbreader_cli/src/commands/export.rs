//! Export command implementation.

use dbreader_core::{BatchDriver, BatchReport, ExportConfig, GdbmOpener};
use std::io;
use std::path::PathBuf;
use tracing::debug;

/// Exports each file in `files` next to itself.
pub fn run(files: &[PathBuf], config: ExportConfig) -> BatchReport {
    debug!(files = files.len(), suffix = %config.suffix, "starting export");

    let opener = GdbmOpener::new(config.lock_mode);
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut driver = BatchDriver::new(opener, config, stdout.lock(), stderr.lock());
    driver.run(files)
}
