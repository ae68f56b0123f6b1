//! Export configuration.

use dbreader_storage::LockMode;

/// Suffix appended to each input path to name its output.
pub const DEFAULT_SUFFIX: &str = ".tsv";

/// Whether keys and values are checked for separator bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Report NUL, tab and newline bytes on the diagnostics stream.
    #[default]
    Warn,
    /// Do not inspect record bytes.
    Off,
}

/// What a failed write to the output file does to that file's export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Count and log the failure, keep going, report success.
    #[default]
    Ignore,
    /// Stop the walk and report the file as failed.
    Abort,
}

/// Whether an input that cannot be opened fails the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Skipped inputs do not affect the batch result.
    #[default]
    Tolerate,
    /// Any skipped input fails the batch.
    Fail,
}

/// Configuration for a batch export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Suffix appended to each input path.
    pub suffix: String,

    /// Separator byte checking.
    pub validation: ValidationMode,

    /// Handling of output write failures.
    pub write_failures: WriteFailurePolicy,

    /// Handling of inputs that cannot be opened.
    pub skips: SkipPolicy,

    /// Advisory locking of input files.
    pub lock_mode: LockMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
            validation: ValidationMode::Warn,
            write_failures: WriteFailurePolicy::Ignore,
            skips: SkipPolicy::Tolerate,
            lock_mode: LockMode::Shared,
        }
    }
}

impl ExportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output suffix.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets separator byte checking.
    #[must_use]
    pub const fn validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Sets handling of output write failures.
    #[must_use]
    pub const fn write_failures(mut self, policy: WriteFailurePolicy) -> Self {
        self.write_failures = policy;
        self
    }

    /// Sets handling of inputs that cannot be opened.
    #[must_use]
    pub const fn skips(mut self, policy: SkipPolicy) -> Self {
        self.skips = policy;
        self
    }

    /// Sets advisory locking of input files.
    #[must_use]
    pub const fn lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }
}
