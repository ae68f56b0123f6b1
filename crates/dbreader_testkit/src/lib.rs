//! # dbreader Testkit
//!
//! Test utilities for dbreader.
//!
//! This crate provides:
//! - A builder for synthetic GDBM images in any supported layout
//! - Temporary directory fixtures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use dbreader_testkit::prelude::*;
//!
//! let workspace = TempWorkspace::new();
//! let image = GdbmImageBuilder::new().record("alice", "admin").build();
//! let path = workspace.write_db("users.db", &image);
//! assert!(path.exists());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod image;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::image::*;
}

pub use fixtures::*;
pub use generators::*;
pub use image::*;
