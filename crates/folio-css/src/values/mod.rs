//! CSS value model, unit conversion, colors, and shorthand expansion.
//!
//! All sizes in the layout pipeline resolve to **points** (1/72 inch),
//! the native unit of the fixed-page output. The conversion table is
//! exact and fixed:
//!
//! | unit | points    |
//! |------|-----------|
//! | `pt` | 1         |
//! | `px` | 1         |
//! | `in` | 72        |
//! | `cm` | 28.3465   |
//! | `mm` | 2.83465   |
//! | `pc` | 12        |
//!
//! `em` and `%` are relative and resolve against a base supplied by the
//! caller. The keywords `auto`, `none` and the bare number `0` all
//! resolve to `0.0`.

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::tokenizer::CssToken;

/// Points per inch.
pub const PT_PER_IN: f64 = 72.0;
/// Points per centimeter.
pub const PT_PER_CM: f64 = 28.346_456_692_913_385;
/// Points per millimeter.
pub const PT_PER_MM: f64 = 2.834_645_669_291_338_5;
/// Points per pica.
pub const PT_PER_PC: f64 = 12.0;

/// A size unit attached to a [`Value::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Unit {
    /// Points, 1/72 inch. The pipeline's native unit.
    Pt,
    /// Pixels, treated as equal to points in fixed-page output.
    Px,
    /// Inches.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
    /// Picas, 12 points.
    Pc,
    /// Relative to the current font size.
    Em,
    /// Relative to a caller-supplied base (containing width, font size).
    #[strum(serialize = "%")]
    Percent,
}

impl Unit {
    /// Conversion factor to points for the absolute units; `None` for
    /// relative units (`em`, `%`).
    #[must_use]
    pub const fn points_factor(self) -> Option<f64> {
        match self {
            Self::Pt | Self::Px => Some(1.0),
            Self::In => Some(PT_PER_IN),
            Self::Cm => Some(PT_PER_CM),
            Self::Mm => Some(PT_PER_MM),
            Self::Pc => Some(PT_PER_PC),
            Self::Em | Self::Percent => None,
        }
    }
}

/// An RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 = opaque.
    pub a: u8,
}

impl Rgba {
    /// An opaque color from RGB channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

/// The tagged value union carried by every declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// A bare identifier (`auto`, `solid`, `justify`).
    Ident(String),
    /// A number with an optional unit. Unitless numbers carry `None`.
    Number {
        /// The numeric value.
        value: f64,
        /// The unit, if one was written.
        unit: Option<Unit>,
    },
    /// A resolved color.
    Color(Rgba),
    /// A quoted string literal.
    StringLit(String),
    /// A `url(...)` reference.
    Uri(String),
    /// An unresolved function call (`rgb()` resolves to [`Value::Color`]
    /// at parse time; anything else is preserved here).
    Function {
        /// The function name.
        name: String,
        /// The argument values, commas dropped.
        args: Vec<Value>,
    },
    /// A whitespace- or comma-separated list of values.
    List(Vec<Value>),
}

impl Value {
    /// The identifier text if this is an [`Value::Ident`], lowercased.
    #[must_use]
    pub fn as_ident(&self) -> Option<String> {
        match self {
            Self::Ident(name) => Some(name.to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Resolve this value to points.
    ///
    /// `em_base` is the current font size in points; `percent_base` is
    /// whatever quantity percentages measure against at the call site.
    /// `auto`, `none` and unitless `0` resolve to `0.0`; anything
    /// unresolvable returns `None` so the caller can pick its
    /// property-specific default.
    #[must_use]
    pub fn to_points(&self, em_base: f64, percent_base: f64) -> Option<f64> {
        match self {
            Self::Number { value, unit } => match unit {
                Some(u) => match u.points_factor() {
                    Some(factor) => Some(value * factor),
                    None => match u {
                        Unit::Em => Some(value * em_base),
                        Unit::Percent => Some(value / 100.0 * percent_base),
                        _ => None,
                    },
                },
                // A unitless number is only a valid size when it is zero.
                None => (*value == 0.0).then_some(0.0),
            },
            Self::Ident(name)
                if name.eq_ignore_ascii_case("auto") || name.eq_ignore_ascii_case("none") =>
            {
                Some(0.0)
            }
            Self::List(values) => values.first().and_then(|v| v.to_points(em_base, percent_base)),
            _ => None,
        }
    }

    /// Resolve to points treating relative units against a zero base.
    #[must_use]
    pub fn to_points_absolute(&self) -> Option<f64> {
        self.to_points(0.0, 0.0)
    }

    /// The color if this value is (or contains as its head) a color.
    #[must_use]
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Ident(name) => named_color(name),
            Self::List(values) => values.first().and_then(Self::as_color),
            _ => None,
        }
    }

    /// Flatten to a slice of component values: a `List` yields its
    /// elements, anything else yields itself.
    #[must_use]
    pub fn components(&self) -> Vec<&Value> {
        match self {
            Self::List(values) => values.iter().collect(),
            other => vec![other],
        }
    }
}

/// The four sides of a box, clockwise from the top.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Edges<T> {
    /// Top side.
    pub top: T,
    /// Right side.
    pub right: T,
    /// Bottom side.
    pub bottom: T,
    /// Left side.
    pub left: T,
}

impl<T: Clone> Edges<T> {
    /// All four sides set to the same value.
    pub fn uniform(value: T) -> Self {
        Self {
            top: value.clone(),
            right: value.clone(),
            bottom: value.clone(),
            left: value,
        }
    }
}

/// Expand a 1-4 value box shorthand (`margin`, `padding`,
/// `border-width`, `border-color`, `border-style`) using the CSS
/// clockwise pairing rule:
///
/// - 1 value → all four sides
/// - 2 values → `(vertical, horizontal)`
/// - 3 values → `(top, horizontal, bottom)`
/// - 4 values → `(top, right, bottom, left)`
///
/// Returns `None` for an empty or over-long component list.
#[must_use]
pub fn expand_box_shorthand(values: &[&Value]) -> Option<Edges<Value>> {
    match values {
        [all] => Some(Edges::uniform((*all).clone())),
        [v, h] => Some(Edges {
            top: (*v).clone(),
            right: (*h).clone(),
            bottom: (*v).clone(),
            left: (*h).clone(),
        }),
        [top, h, bottom] => Some(Edges {
            top: (*top).clone(),
            right: (*h).clone(),
            bottom: (*bottom).clone(),
            left: (*h).clone(),
        }),
        [top, right, bottom, left] => Some(Edges {
            top: (*top).clone(),
            right: (*right).clone(),
            bottom: (*bottom).clone(),
            left: (*left).clone(),
        }),
        _ => None,
    }
}

/// Convert a single token into a value, resolving dimension units.
/// Unknown units degrade to a unitless number so a later consumer can
/// decide how loudly to complain.
#[must_use]
pub fn token_to_value(token: &CssToken) -> Option<Value> {
    match token {
        CssToken::Ident(name) => Some(Value::Ident(name.clone())),
        CssToken::Number(value) => Some(Value::Number {
            value: *value,
            unit: None,
        }),
        CssToken::Percentage(value) => Some(Value::Number {
            value: *value,
            unit: Some(Unit::Percent),
        }),
        CssToken::Dimension { value, unit } => Some(Value::Number {
            value: *value,
            unit: unit.parse::<Unit>().ok(),
        }),
        CssToken::String(text) => Some(Value::StringLit(text.clone())),
        CssToken::Url(target) => Some(Value::Uri(target.clone())),
        CssToken::Hash(hex) => parse_hex_color(hex).map(Value::Color),
        _ => None,
    }
}

/// Parse a `#rgb` or `#rrggbb` hex color (leading `#` stripped).
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<Rgba> {
    let digit = |c: char| c.to_digit(16).map(|d| u8::try_from(d).unwrap_or(0));
    let chars: Vec<char> = hex.chars().collect();
    match chars.as_slice() {
        [r, g, b] => {
            let (r, g, b) = (digit(*r)?, digit(*g)?, digit(*b)?);
            Some(Rgba::rgb(r * 17, g * 17, b * 17))
        }
        [r1, r2, g1, g2, b1, b2] => Some(Rgba::rgb(
            digit(*r1)? * 16 + digit(*r2)?,
            digit(*g1)? * 16 + digit(*g2)?,
            digit(*b1)? * 16 + digit(*b2)?,
        )),
        _ => None,
    }
}

/// Resolve an `rgb(...)`/`rgba(...)` argument list to a color.
/// Channels may be numbers (0-255) or percentages.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_rgb_function(args: &[Value]) -> Option<Rgba> {
    let channel = |v: &Value| -> Option<u8> {
        match v {
            Value::Number { value, unit: None } => {
                Some(value.round().clamp(0.0, 255.0) as u8)
            }
            Value::Number {
                value,
                unit: Some(Unit::Percent),
            } => Some((value / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8),
            _ => None,
        }
    };
    let mut it = args.iter();
    let r = channel(it.next()?)?;
    let g = channel(it.next()?)?;
    let b = channel(it.next()?)?;
    let a = match it.next() {
        Some(Value::Number { value, unit: None }) => {
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Some(_) => return None,
        None => 255,
    };
    Some(Rgba { r, g, b, a })
}

/// Resolve a CSS color keyword.
///
/// The 16 HTML basic colors plus the handful of extended keywords that
/// show up routinely in print stylesheets. Unknown keywords return
/// `None` and the caller falls back to its default.
#[must_use]
pub fn named_color(name: &str) -> Option<Rgba> {
    let c = |r, g, b| Some(Rgba::rgb(r, g, b));
    match name.to_ascii_lowercase().as_str() {
        "black" => c(0, 0, 0),
        "silver" => c(192, 192, 192),
        "gray" | "grey" => c(128, 128, 128),
        "white" => c(255, 255, 255),
        "maroon" => c(128, 0, 0),
        "red" => c(255, 0, 0),
        "purple" => c(128, 0, 128),
        "fuchsia" | "magenta" => c(255, 0, 255),
        "green" => c(0, 128, 0),
        "lime" => c(0, 255, 0),
        "olive" => c(128, 128, 0),
        "yellow" => c(255, 255, 0),
        "navy" => c(0, 0, 128),
        "blue" => c(0, 0, 255),
        "teal" => c(0, 128, 128),
        "aqua" | "cyan" => c(0, 255, 255),
        "orange" => c(255, 165, 0),
        "brown" => c(165, 42, 42),
        "pink" => c(255, 192, 203),
        "transparent" => Some(Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }),
        _ => None,
    }
}
