//! The inheritable style record and its keyword enums.
//!
//! One [`StyleState`] exists per currently-open element during the tree
//! walk. It is **cloned** on entry to every element (never aliased),
//! mutated by whatever properties the cascade resolved for that element,
//! and popped on exit — a pure stack discipline. Leaf fragments hold an
//! [`StyleSnapshot`] (a cheap `Arc` of the state as it was when the
//! fragment was emitted), so no fragment can observe a later sibling's
//! mutations.

use std::sync::Arc;

use serde::Serialize;
use strum_macros::{Display, EnumString};

use folio_css::Rgba;
use folio_css::values::Edges;

/// An immutable style snapshot carried by leaf fragments.
pub type StyleSnapshot = Arc<StyleState>;

/// Horizontal alignment of a paragraph's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextAlign {
    /// Lines start at the left edge.
    #[default]
    Left,
    /// Lines end at the right edge.
    Right,
    /// Lines are centered.
    Center,
    /// Extra space distributes across inter-word gaps, except on the
    /// last line of the paragraph.
    Justify,
}

/// [§ 16.6 White space](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
/// collapsing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WhiteSpace {
    /// Runs of whitespace collapse to a single space fragment.
    #[default]
    Normal,
    /// Newlines become explicit line breaks, tabs become literal
    /// spaces, nothing collapses.
    Pre,
}

/// Base text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left: fragments are linearly reordered per line.
    Rtl,
}

/// How the paragraph's leading is derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeadingMode {
    /// Leading is at least the style value, growing with tall content.
    #[default]
    Max,
    /// Leading is at most the style value.
    Min,
    /// Leading is exactly the style value.
    Fixed,
}

/// Border line style. Only `None` versus drawn matters to layout; the
/// distinction between drawn styles is for the drawing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BorderStyle {
    /// No border.
    #[default]
    None,
    /// Single solid line.
    Solid,
    /// Dashed line.
    Dashed,
    /// Dotted line.
    Dotted,
    /// Two parallel lines.
    Double,
}

/// Vertical alignment of an inline image against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VerticalAlign {
    /// Bottom of the image sits on the baseline.
    #[default]
    Baseline,
    /// Top of the image aligns with the line top.
    Top,
    /// Image midpoint aligns with the baseline.
    Middle,
    /// Bottom of the image aligns with the line bottom.
    Bottom,
}

/// List bullet style for `display: list-item` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ListStyle {
    /// Filled circle bullet.
    #[default]
    Disc,
    /// Open circle bullet.
    Circle,
    /// Filled square bullet.
    Square,
    /// Arabic numerals.
    Decimal,
    /// Lowercase letters.
    LowerAlpha,
    /// Uppercase letters.
    UpperAlpha,
    /// Lowercase roman numerals.
    LowerRoman,
    /// Uppercase roman numerals.
    UpperRoman,
    /// No marker.
    None,
}

/// One side of an element's border.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BorderSide {
    /// Line width in points. Zero draws nothing.
    pub width: f64,
    /// Line style.
    pub style: BorderStyle,
    /// Line color; `None` inherits the text color.
    pub color: Option<Rgba>,
}

impl BorderSide {
    /// Whether this side produces visible output.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.style != BorderStyle::None
    }
}

/// The full inheritable style record.
///
/// Every field the style resolver can set from a cascaded property
/// lives here; the paragraph engine and table layout read it but never
/// write it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleState {
    /// `font-family` list, first recognized name wins.
    pub font_family: Vec<String>,
    /// `font-size` in points.
    pub font_size: f64,
    /// Whether `font-weight` resolved to a bold face.
    pub bold: bool,
    /// Whether `font-style` resolved to an italic face.
    pub italic: bool,

    /// Text color.
    pub color: Rgba,
    /// Background fill behind the element's content, if any.
    pub background: Option<Rgba>,

    /// Paragraph alignment.
    pub align: TextAlign,
    /// Whitespace collapsing mode.
    pub white_space: WhiteSpace,
    /// Base direction.
    pub direction: Direction,
    /// Whether text is underlined.
    pub underline: bool,
    /// Whether text is struck through.
    pub strike: bool,
    /// Hyperlink target when inside an `<a href>`.
    pub link: Option<String>,
    /// Extra advance per character, points.
    pub letter_spacing: f64,
    /// Extra advance per space, points.
    pub word_spacing: f64,

    /// How leading derives from content heights.
    pub leading_mode: LeadingMode,
    /// The style's leading contribution in points.
    pub leading: f64,

    /// Left indent of the block, points.
    pub indent_left: f64,
    /// Right indent of the block, points.
    pub indent_right: f64,
    /// Additional indent of the first line, points.
    pub first_line_indent: f64,
    /// Vertical space before the block, points.
    pub space_before: f64,
    /// Vertical space after the block, points.
    pub space_after: f64,

    /// The four border sides.
    pub border: Edges<BorderSide>,
    /// The four padding widths, points.
    pub padding: Edges<f64>,
    /// The four margin widths, points.
    pub margin: Edges<f64>,

    /// Bullet style for list items.
    pub list_style: ListStyle,
    /// Vertical alignment for inline images.
    pub vertical_align: VerticalAlign,
    /// Scale factor applied to resolved sizes.
    pub zoom: f64,

    /// Subscript: shrink and lower against the baseline.
    pub sub: bool,
    /// Superscript: shrink and raise against the baseline.
    pub superscript: bool,
    /// Set while emitting into a static (header/footer) frame; page
    /// number placeholders stay unresolved there until each page draws.
    pub inside_static_frame: bool,
    /// The element renders the current page number.
    pub page_number: bool,
    /// The element renders the total page count.
    pub page_count: bool,
}

/// Default body font size in points.
pub const DEFAULT_FONT_SIZE: f64 = 10.0;
/// Default leading as a multiple of font size.
pub const DEFAULT_LEADING_FACTOR: f64 = 1.2;

impl Default for StyleState {
    fn default() -> Self {
        Self {
            font_family: vec!["helvetica".to_string()],
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            color: Rgba::BLACK,
            background: None,
            align: TextAlign::default(),
            white_space: WhiteSpace::default(),
            direction: Direction::default(),
            underline: false,
            strike: false,
            link: None,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            leading_mode: LeadingMode::default(),
            leading: DEFAULT_FONT_SIZE * DEFAULT_LEADING_FACTOR,
            indent_left: 0.0,
            indent_right: 0.0,
            first_line_indent: 0.0,
            space_before: 0.0,
            space_after: 0.0,
            border: Edges::default(),
            padding: Edges::default(),
            margin: Edges::default(),
            list_style: ListStyle::default(),
            vertical_align: VerticalAlign::default(),
            zoom: 1.0,
            sub: false,
            superscript: false,
            inside_static_frame: false,
            page_number: false,
            page_count: false,
        }
    }
}

impl StyleState {
    /// The root style a document walk starts from.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Freeze the current state into an immutable snapshot for a leaf
    /// fragment.
    #[must_use]
    pub fn snapshot(&self) -> StyleSnapshot {
        Arc::new(self.clone())
    }

    /// Effective font size after zoom and sub/superscript shrink.
    #[must_use]
    pub fn effective_font_size(&self) -> f64 {
        let base = self.font_size * self.zoom;
        if self.sub || self.superscript {
            base * 0.6
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let mut state = StyleState::root();
        state.bold = true;
        let snap = state.snapshot();
        state.bold = false;
        state.font_size = 24.0;
        assert!(snap.bold);
        assert!((snap.font_size - DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_keyword_enums_parse_from_css_idents() {
        assert_eq!("justify".parse::<TextAlign>().ok(), Some(TextAlign::Justify));
        assert_eq!("PRE".parse::<WhiteSpace>().ok(), Some(WhiteSpace::Pre));
        assert_eq!("rtl".parse::<Direction>().ok(), Some(Direction::Rtl));
        assert_eq!(
            "lower-roman".parse::<ListStyle>().ok(),
            Some(ListStyle::LowerRoman)
        );
        assert!("wavy".parse::<BorderStyle>().is_err());
    }

    #[test]
    fn test_effective_font_size_sub_super() {
        let mut state = StyleState::root();
        state.font_size = 10.0;
        state.sub = true;
        assert!((state.effective_font_size() - 6.0).abs() < 1e-9);
        state.sub = false;
        state.zoom = 2.0;
        assert!((state.effective_font_size() - 20.0).abs() < 1e-9);
    }
}
