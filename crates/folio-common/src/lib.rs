//! Common infrastructure for the folio layout engine.
//!
//! This crate provides shared infrastructure used by all layout components:
//! - **Diagnostics** - per-run warning/error collection with deduplication
//! - **Errors** - structured error types for CSS parsing and layout

pub mod diagnostics;
pub mod error;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::FolioError;
