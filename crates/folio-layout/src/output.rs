//! The layout item stream handed to the page/frame geometry manager.
//!
//! The resolver emits one item per closed block plus explicit break
//! tokens. The geometry manager downstream owns frame assignment: it
//! calls [`crate::Paragraph::layout`] against each frame's width,
//! consults [`crate::ParagraphLayout::fit_index`], and splits through
//! [`crate::Paragraph::split`] when a block straddles a frame boundary.

use crate::paragraph::Paragraph;
use crate::table::TableData;

/// An explicit break directive cascaded from break properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// Start a new page.
    Page,
    /// Advance to the next frame on the current page.
    Frame,
}

/// One element of the output stream, in document order.
#[derive(Debug, Clone)]
pub enum LayoutItem {
    /// A closed block of inline content.
    Paragraph(Paragraph),
    /// A table region with resolved column geometry.
    Table(Box<TableData>),
    /// An explicit page or frame break.
    ExplicitBreak(BreakKind),
}
