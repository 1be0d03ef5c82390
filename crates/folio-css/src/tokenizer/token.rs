//! CSS token types per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).

use core::fmt;

/// CSS tokens as produced by [`CssTokenizer`](super::CssTokenizer).
///
/// A subset of the CSS Syntax Level 3 token set: the tokens the folio
/// parser consumes. `<bad-string>`/`<bad-url>` collapse into [`Self::Bad`]
/// since both are handled identically (skip the enclosing rule).
#[derive(Debug, Clone, PartialEq)]
pub enum CssToken {
    /// `<ident-token>`
    Ident(String),
    /// `<function-token>` — the name before `(`.
    Function(String),
    /// `<at-keyword-token>` — the name after `@`.
    AtKeyword(String),
    /// `<hash-token>` — the value after `#`.
    Hash(String),
    /// `<string-token>`
    String(String),
    /// `<url-token>` — the unquoted value inside `url(...)`.
    Url(String),
    /// `<delim-token>`
    Delim(char),
    /// `<number-token>`
    Number(f64),
    /// `<percentage-token>` — numeric value, percent sign stripped.
    Percentage(f64),
    /// `<dimension-token>` — numeric value plus raw unit text.
    Dimension {
        /// The numeric value.
        value: f64,
        /// The unit as written (`pt`, `px`, `cm`, ...), not yet validated.
        unit: String,
    },
    /// `<whitespace-token>` — one or more whitespace code points.
    Whitespace,
    /// `<colon-token>`
    Colon,
    /// `<semicolon-token>`
    Semicolon,
    /// `<comma-token>`
    Comma,
    /// `<[-token>`
    LeftBracket,
    /// `<]-token>`
    RightBracket,
    /// `<(-token>`
    LeftParen,
    /// `<)-token>`
    RightParen,
    /// `<{-token>`
    LeftBrace,
    /// `<}-token>`
    RightBrace,
    /// `<CDO-token>` (`<!--`)
    Cdo,
    /// `<CDC-token>` (`-->`)
    Cdc,
    /// A tokenization error (`<bad-string-token>` / `<bad-url-token>`).
    Bad,
    /// End of input.
    Eof,
}

impl CssToken {
    /// Returns true if this is the EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }
}

impl fmt::Display for CssToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => write!(f, "{v}"),
            Self::Function(v) => write!(f, "{v}("),
            Self::AtKeyword(v) => write!(f, "@{v}"),
            Self::Hash(v) => write!(f, "#{v}"),
            Self::String(v) => write!(f, "\"{v}\""),
            Self::Url(v) => write!(f, "url({v})"),
            Self::Delim(c) => write!(f, "{c}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Percentage(v) => write!(f, "{v}%"),
            Self::Dimension { value, unit } => write!(f, "{value}{unit}"),
            Self::Whitespace => write!(f, " "),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Cdo => write!(f, "<!--"),
            Self::Cdc => write!(f, "-->"),
            Self::Bad => write!(f, "<bad>"),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}
