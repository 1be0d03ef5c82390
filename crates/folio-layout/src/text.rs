//! Text measurement collaborator interface.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! The line breaker needs exactly three things from the host's font
//! stack: advance widths, ascent/descent, and font-alias resolution.
//! Everything else (glyph embedding, subsetting, rasterization) stays on
//! the host's side of this trait. Implementations must be deterministic
//! for a given handle: laying out the same fragments twice must measure
//! identically.

/// An opaque, resolved font the measurement collaborator hands back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontHandle {
    /// The resolved family name.
    pub family: String,
    /// Whether the bold face was selected.
    pub bold: bool,
    /// Whether the italic face was selected.
    pub italic: bool,
}

/// Font metrics interface for text measurement during layout.
pub trait TextMeasure {
    /// Total advance width of `text` at `font_size` points.
    fn width(&self, text: &str, font: &FontHandle, font_size: f64) -> f64;

    /// `(ascent, descent)` in points at `font_size`. Descent is
    /// negative (a depth below the baseline).
    fn ascent_descent(&self, font: &FontHandle, font_size: f64) -> (f64, f64);

    /// Resolve a `font-family` list plus weight/style flags to a
    /// concrete handle. The first recognized name wins; an empty or
    /// fully unrecognized list falls back to the default face.
    fn resolve_font_alias(&self, names: &[String], bold: bool, italic: bool) -> FontHandle;
}

/// Approximate metrics using fixed ratios.
///
/// The average advance width of Latin glyphs in a proportional font is
/// approximately 0.6× the font size; ascent/descent use 0.8/-0.2, a
/// common split for body faces. Used as a fallback when no real font
/// collaborator is wired in, and by the test suites, where determinism
/// matters more than fidelity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateTextMeasure;

/// Advance width per character as a fraction of font size.
const CHAR_WIDTH_RATIO: f64 = 0.6;
/// Ascent as a fraction of font size.
const ASCENT_RATIO: f64 = 0.8;
/// Descent as a fraction of font size (below the baseline).
const DESCENT_RATIO: f64 = -0.2;

impl TextMeasure for ApproximateTextMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn width(&self, text: &str, _font: &FontHandle, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * CHAR_WIDTH_RATIO
    }

    fn ascent_descent(&self, _font: &FontHandle, font_size: f64) -> (f64, f64) {
        (font_size * ASCENT_RATIO, font_size * DESCENT_RATIO)
    }

    fn resolve_font_alias(&self, names: &[String], bold: bool, italic: bool) -> FontHandle {
        FontHandle {
            family: names
                .first()
                .cloned()
                .unwrap_or_else(|| "helvetica".to_string()),
            bold,
            italic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_deterministic_and_linear() {
        let measure = ApproximateTextMeasure;
        let font = measure.resolve_font_alias(&[], false, false);
        let a = measure.width("hello", &font, 10.0);
        let b = measure.width("hello", &font, 10.0);
        assert!((a - b).abs() < f64::EPSILON);
        assert!((measure.width("hello", &font, 20.0) - 2.0 * a).abs() < 1e-9);
    }

    #[test]
    fn test_descent_is_below_baseline() {
        let measure = ApproximateTextMeasure;
        let font = measure.resolve_font_alias(&["times".to_string()], true, false);
        let (ascent, descent) = measure.ascent_descent(&font, 12.0);
        assert!(ascent > 0.0);
        assert!(descent < 0.0);
    }
}
