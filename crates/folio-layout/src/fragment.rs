//! Leaf fragments: the minimal styled units of content.
//!
//! A fragment is immutable once created and carries an immutable
//! [`StyleSnapshot`] — never a reference to the live, mutable style
//! state. Widths and vertical metrics are measured once at emission
//! time, so the line breaker downstream needs no access to the text
//! measurement collaborator at all.
//!
//! A fragment list belongs to exactly one in-progress block; ownership
//! transfers to a [`crate::Paragraph`] when the block closes.

use serde::Serialize;

use crate::style::{StyleSnapshot, StyleState, VerticalAlign};
use crate::text::TextMeasure;

/// A minimal styled unit of content.
#[derive(Debug, Clone, Serialize)]
pub enum Fragment {
    /// A run of non-breakable text.
    Word {
        /// The text content.
        text: String,
        /// Style at emission time.
        style: StyleSnapshot,
        /// Measured advance width, points.
        width: f64,
        /// Ascent above the baseline, points.
        ascent: f64,
        /// Descent below the baseline, points (negative).
        descent: f64,
    },
    /// A soft break opportunity with the width of one space.
    Space {
        /// Style at emission time.
        style: StyleSnapshot,
        /// Measured space width, points.
        width: f64,
        /// Ascent above the baseline, points.
        ascent: f64,
        /// Descent below the baseline, points (negative).
        descent: f64,
    },
    /// A forced line break (`<br>`, or a newline under `pre`).
    LineBreak,
    /// Start of an inline box carrying borders/background.
    BoxBegin {
        /// Style at emission time; borders, padding and background are
        /// read from here when the box is drawn.
        style: StyleSnapshot,
    },
    /// End of the innermost open inline box.
    BoxEnd,
    /// An inline image.
    Image {
        /// Host-resolvable image reference.
        source: String,
        /// Display width, points.
        width: f64,
        /// Display height, points.
        height: f64,
        /// Alignment against the baseline.
        valign: VerticalAlign,
        /// Hyperlink target, if the image sits inside a link.
        link: Option<String>,
    },
    /// Placeholder for the current page number, resolved when the page
    /// draws.
    PageNumber {
        /// Style at emission time.
        style: StyleSnapshot,
        /// Reserved width, points.
        width: f64,
        /// Ascent above the baseline, points.
        ascent: f64,
        /// Descent below the baseline, points (negative).
        descent: f64,
    },
    /// Placeholder for the total page count.
    PageCount {
        /// Style at emission time.
        style: StyleSnapshot,
        /// Reserved width, points.
        width: f64,
        /// Ascent above the baseline, points.
        ascent: f64,
        /// Descent below the baseline, points (negative).
        descent: f64,
    },
}

/// Width reserved for page number/count placeholders, measured as if
/// they rendered three digits.
const PLACEHOLDER_TEXT: &str = "000";

impl Fragment {
    /// Build a word fragment, measuring it with the given collaborator.
    #[must_use]
    pub fn word(text: &str, style: &StyleState, measure: &dyn TextMeasure) -> Self {
        let font = measure.resolve_font_alias(&style.font_family, style.bold, style.italic);
        let size = style.effective_font_size();
        #[allow(clippy::cast_precision_loss)]
        let spacing = style.letter_spacing * text.chars().count() as f64;
        let (ascent, descent) = measure.ascent_descent(&font, size);
        Self::Word {
            text: text.to_string(),
            style: style.snapshot(),
            width: measure.width(text, &font, size) + spacing,
            ascent,
            descent,
        }
    }

    /// Build a space fragment in the current style.
    #[must_use]
    pub fn space(style: &StyleState, measure: &dyn TextMeasure) -> Self {
        let font = measure.resolve_font_alias(&style.font_family, style.bold, style.italic);
        let size = style.effective_font_size();
        let (ascent, descent) = measure.ascent_descent(&font, size);
        Self::Space {
            style: style.snapshot(),
            width: measure.width(" ", &font, size) + style.word_spacing,
            ascent,
            descent,
        }
    }

    /// Build a page-number or page-count placeholder.
    #[must_use]
    pub fn page_placeholder(style: &StyleState, measure: &dyn TextMeasure, count: bool) -> Self {
        let font = measure.resolve_font_alias(&style.font_family, style.bold, style.italic);
        let size = style.effective_font_size();
        let width = measure.width(PLACEHOLDER_TEXT, &font, size);
        let (ascent, descent) = measure.ascent_descent(&font, size);
        let style = style.snapshot();
        if count {
            Self::PageCount {
                style,
                width,
                ascent,
                descent,
            }
        } else {
            Self::PageNumber {
                style,
                width,
                ascent,
                descent,
            }
        }
    }

    /// The fragment's advance width. Breaks and box boundaries are
    /// zero-width.
    #[must_use]
    pub fn width(&self) -> f64 {
        match self {
            Self::Word { width, .. }
            | Self::Space { width, .. }
            | Self::Image { width, .. }
            | Self::PageNumber { width, .. }
            | Self::PageCount { width, .. } => *width,
            Self::LineBreak | Self::BoxBegin { .. } | Self::BoxEnd => 0.0,
        }
    }

    /// Ascent above the baseline. Images ascend by their full height
    /// under baseline alignment.
    #[must_use]
    pub fn ascent(&self) -> f64 {
        match self {
            Self::Word { ascent, .. }
            | Self::Space { ascent, .. }
            | Self::PageNumber { ascent, .. }
            | Self::PageCount { ascent, .. } => *ascent,
            Self::Image { height, .. } => *height,
            Self::LineBreak | Self::BoxBegin { .. } | Self::BoxEnd => 0.0,
        }
    }

    /// Descent below the baseline, negative or zero.
    #[must_use]
    pub fn descent(&self) -> f64 {
        match self {
            Self::Word { descent, .. }
            | Self::Space { descent, .. }
            | Self::PageNumber { descent, .. }
            | Self::PageCount { descent, .. } => *descent,
            Self::Image { .. } | Self::LineBreak | Self::BoxBegin { .. } | Self::BoxEnd => 0.0,
        }
    }

    /// Whether this fragment is a soft break opportunity.
    #[must_use]
    pub const fn is_soft_break(&self) -> bool {
        matches!(self, Self::Space { .. })
    }

    /// The style snapshot, for fragments that carry one.
    #[must_use]
    pub const fn style(&self) -> Option<&StyleSnapshot> {
        match self {
            Self::Word { style, .. }
            | Self::Space { style, .. }
            | Self::BoxBegin { style }
            | Self::PageNumber { style, .. }
            | Self::PageCount { style, .. } => Some(style),
            Self::LineBreak | Self::BoxEnd | Self::Image { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproximateTextMeasure;

    #[test]
    fn test_word_measures_at_emission_time() {
        let measure = ApproximateTextMeasure;
        let mut style = StyleState::root();
        style.font_size = 10.0;
        let frag = Fragment::word("abcd", &style, &measure);
        assert!((frag.width() - 24.0).abs() < 1e-9);

        // Mutating the live style after emission changes nothing.
        style.font_size = 40.0;
        assert!((frag.width() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_fragments() {
        assert!(Fragment::LineBreak.width().abs() < f64::EPSILON);
        assert!(Fragment::BoxEnd.width().abs() < f64::EPSILON);
    }

    #[test]
    fn test_image_ascends_by_height() {
        let image = Fragment::Image {
            source: "logo.png".to_string(),
            width: 30.0,
            height: 20.0,
            valign: VerticalAlign::Baseline,
            link: None,
        };
        assert!((image.ascent() - 20.0).abs() < f64::EPSILON);
        assert!(image.descent().abs() < f64::EPSILON);
    }
}
