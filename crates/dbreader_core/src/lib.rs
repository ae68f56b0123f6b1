//! # dbreader Core
//!
//! Exports GDBM databases to tab-separated text.
//!
//! This crate provides:
//! - A read-only GDBM reader ([`GdbmFile`]) over any storage backend
//! - Store capability traits ([`KeyValueStore`], [`StoreOpener`])
//! - The separator byte validator and the TSV record emitter
//! - The walker that exports one store
//! - The batch driver that exports a list of files
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dbreader_core::{BatchDriver, ExportConfig, GdbmOpener};
//! use std::io;
//!
//! let mut driver = BatchDriver::new(
//!     GdbmOpener::default(),
//!     ExportConfig::default(),
//!     io::stdout(),
//!     io::stderr(),
//! );
//! let report = driver.run(&["users.db", "groups.db"]);
//! std::process::exit(report.exit_code());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod config;
mod emit;
mod error;
mod gdbm;
mod store;
mod validate;
mod walker;

pub use batch::{export_store, output_path, BatchDriver, BatchReport, FileOutcome, FileReport};
pub use config::{ExportConfig, SkipPolicy, ValidationMode, WriteFailurePolicy, DEFAULT_SUFFIX};
pub use emit::{emit_record, split_line, FIELD_SEPARATOR, RECORD_SEPARATOR};
pub use error::{CoreError, CoreResult};
pub use gdbm::{GdbmFile, GdbmOpener};
pub use store::{KeyValueStore, MemoryOpener, MemoryStore, StoreOpener};
pub use validate::{check_characters, ByteClass};
pub use walker::{walk, WalkReport};

pub use dbreader_storage::LockMode;
