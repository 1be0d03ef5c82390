//! CSS front end and cascade resolution engine for the folio layout
//! pipeline.
//!
//! The crate is layered leaf-first:
//!
//! - [`tokenizer`] turns CSS source into a token stream.
//! - [`values`] defines the value union, unit conversion, colors, and
//!   shorthand expansion.
//! - [`selector`] defines the selector model (tag/namespace gate plus an
//!   ordered qualifier list) with cached specificity and matching against
//!   the [`folio_dom::Element`] adapter.
//! - [`parser`] assembles rules, routes at-rules, and applies the medium
//!   filter.
//! - [`cascade`] stores declarations in per-origin rulesets and resolves,
//!   per element and property, the single winning value.
//!
//! Once a stylesheet is fully parsed the rulesets are immutable; they may
//! be shared read-only across documents. Everything mutable (match cache,
//! diagnostics) lives in per-run context objects.

pub mod cascade;
pub mod parser;
pub mod selector;
pub mod tokenizer;
pub mod values;

pub use cascade::{CascadeEngine, MatchCache, Origin};
pub use parser::{Declaration, Stylesheet, StylesheetParser, StylesheetSource};
pub use selector::{Combinator, Qualifier, Selector, SelectorBuilder, Specificity};
pub use values::{Rgba, Unit, Value};
