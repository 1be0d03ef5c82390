//! Layout pipeline: style resolution, fragment accumulation, paragraph
//! line breaking, and table layout.
//!
//! The pipeline is single-threaded and synchronous: one depth-first walk
//! over the document tree resolves styles through the cascade, collects
//! leaf fragments per block, and hands each closed block to the line
//! breaker. The geometry manager downstream consumes the resulting
//! [`output::LayoutItem`] stream and assigns it to page frames.
//!
//! # Module Structure
//!
//! - [`text`] - Text measurement collaborator interface
//! - [`style`] - The inheritable style record and its keyword enums
//! - [`fragment`] - Leaf fragments carrying immutable style snapshots
//! - [`paragraph`] - Greedy line breaking, alignment, box/decoration
//!   run bookkeeping, widow/orphan page splitting
//! - [`resolver`] - Document-tree walk folding cascade results into a
//!   style stack and emitting fragments
//! - [`table`] - Column-width distribution and cell span bookkeeping
//! - [`output`] - The layout item stream handed to the geometry manager

pub mod fragment;
pub mod output;
pub mod paragraph;
pub mod resolver;
pub mod style;
pub mod table;
pub mod text;

pub use fragment::Fragment;
pub use output::LayoutItem;
pub use paragraph::{Line, Paragraph, ParagraphLayout};
pub use resolver::StyleResolver;
pub use style::{StyleState, TextAlign, WhiteSpace};
pub use table::TableData;
pub use text::{ApproximateTextMeasure, FontHandle, TextMeasure};
