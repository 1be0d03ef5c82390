//! Stylesheet parser.
//!
//! Consumes the token stream from the tokenizer into style rules and
//! routed at-rules. A malformed rule produces a structured
//! [`FolioError::CssParse`] record in the run diagnostics and is
//! skipped; the scan always continues to the end of the stylesheet.
//!
//! At-rule routing:
//! - `@media` — kept or dropped by the medium filter, contents parsed
//!   recursively.
//! - `@page` and frame at-rules (any name ending in `-frame` or equal
//!   to `frame`) — forwarded unchanged to the geometry collaborator as
//!   [`GeometryRule`]s.
//! - `@font-face` — collected as font-alias declaration sets.
//! - `@import` — resolved through the host-supplied [`ImportLoader`];
//!   without a loader the rule is skipped with a warning.
//! - `@namespace` — records the stylesheet's default namespace, applied
//!   to every following selector that carries no namespace of its own.

use folio_common::{Diagnostics, FolioError};

use crate::selector::{AttrOp, Combinator, Qualifier, Selector, SelectorBuilder};
use crate::tokenizer::{CssToken, CssTokenizer};
use crate::values::{Value, parse_rgb_function, token_to_value};

/// `(propertyName, value, important)` — one parsed declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name, lowercase.
    pub property: String,
    /// The parsed value.
    pub value: Value,
    /// Whether the declaration carried `!important`.
    pub important: bool,
}

/// A style rule: one or more selectors sharing a declaration block.
#[derive(Debug, Clone)]
pub struct StyleRule {
    /// The comma-separated selectors, each frozen.
    pub selectors: Vec<Selector>,
    /// The declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// A page/frame geometry at-rule, forwarded to the geometry
/// collaborator unchanged in meaning.
#[derive(Debug, Clone)]
pub struct GeometryRule {
    /// The at-keyword name (`page`, `frame`, ...), without the `@`.
    pub name: String,
    /// The raw prelude text (page selector, frame name).
    pub prelude: String,
    /// Declarations inside the block.
    pub declarations: Vec<Declaration>,
}

/// A collected `@font-face` rule.
#[derive(Debug, Clone)]
pub struct FontFace {
    /// The declarations (`font-family`, `src`, ...).
    pub declarations: Vec<Declaration>,
}

/// Callback used to resolve `@import` targets to CSS source text.
pub type ImportLoader<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// A fully parsed stylesheet, ready for ruleset insertion.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    /// Style rules in source order.
    pub rules: Vec<StyleRule>,
    /// Page/frame geometry at-rules, in source order.
    pub geometry_rules: Vec<GeometryRule>,
    /// Collected `@font-face` rules.
    pub font_faces: Vec<FontFace>,
    /// Default namespace from `@namespace`, if declared.
    pub default_namespace: Option<String>,
}

/// Buffered stylesheet source with an optional byte budget.
///
/// The budget is the core's only built-in resource guard: a host
/// feeding untrusted input can cap how much source the parser will
/// buffer in memory.
#[derive(Debug, Clone)]
pub struct StylesheetSource {
    /// The CSS source text.
    pub text: String,
    /// Maximum accepted source length in bytes, if bounded.
    pub capacity: Option<usize>,
}

impl StylesheetSource {
    /// An unbounded source.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            capacity: None,
        }
    }

    /// A source with a byte budget.
    #[must_use]
    pub fn with_capacity(text: &str, capacity: usize) -> Self {
        Self {
            text: text.to_string(),
            capacity: Some(capacity),
        }
    }

    /// Tokenize, enforcing the byte budget first.
    ///
    /// # Errors
    ///
    /// [`FolioError::CapacityExceeded`] when the source is longer than
    /// the configured budget.
    pub fn tokenize(&self) -> Result<Vec<CssToken>, FolioError> {
        if let Some(capacity) = self.capacity {
            if self.text.len() > capacity {
                return Err(FolioError::CapacityExceeded { capacity });
            }
        }
        Ok(CssTokenizer::new(&self.text).run())
    }
}

/// Token-stream parser producing a [`Stylesheet`].
pub struct StylesheetParser {
    tokens: Vec<CssToken>,
    position: usize,
}

impl StylesheetParser {
    /// Create a parser over a token stream.
    #[must_use]
    pub fn new(tokens: Vec<CssToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the whole stream.
    ///
    /// `medium` filters `@media` blocks (`"all"` passes everything);
    /// `loader` resolves `@import` targets. Malformed rules are skipped
    /// and reported through `diags`.
    pub fn parse(
        mut self,
        medium: &str,
        diags: &mut Diagnostics,
        loader: Option<&ImportLoader<'_>>,
    ) -> Stylesheet {
        let mut sheet = Stylesheet::default();
        self.consume_rules(medium, diags, loader, &mut sheet);
        sheet
    }

    fn peek(&self) -> &CssToken {
        self.tokens.get(self.position).unwrap_or(&CssToken::Eof)
    }

    fn advance(&mut self) -> CssToken {
        let token = self.peek().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_whitespace() {
            let _ = self.advance();
        }
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    fn consume_rules(
        &mut self,
        medium: &str,
        diags: &mut Diagnostics,
        loader: Option<&ImportLoader<'_>>,
        sheet: &mut Stylesheet,
    ) {
        loop {
            match self.peek() {
                CssToken::Whitespace | CssToken::Cdo | CssToken::Cdc => {
                    let _ = self.advance();
                }
                CssToken::Eof => return,
                // End of an enclosing @media block.
                CssToken::RightBrace => return,
                CssToken::AtKeyword(_) => {
                    self.consume_at_rule(medium, diags, loader, sheet);
                }
                _ => match self.consume_style_rule(diags) {
                    Ok(Some(rule)) => {
                        let rule = match &sheet.default_namespace {
                            Some(ns) => StyleRule {
                                selectors: rule
                                    .selectors
                                    .into_iter()
                                    .map(|s| s.with_default_namespace(ns))
                                    .collect(),
                                declarations: rule.declarations,
                            },
                            None => rule,
                        };
                        sheet.rules.push(rule);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        diags.error("css", &err.to_string());
                        self.recover_past_block();
                    }
                },
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-an-at-rule)
    fn consume_at_rule(
        &mut self,
        medium: &str,
        diags: &mut Diagnostics,
        loader: Option<&ImportLoader<'_>>,
        sheet: &mut Stylesheet,
    ) {
        let CssToken::AtKeyword(name) = self.advance() else {
            return;
        };
        let name = name.to_ascii_lowercase();

        match name.as_str() {
            "media" => self.consume_media_rule(medium, diags, loader, sheet),
            "page" => self.consume_geometry_rule(&name, diags, sheet),
            "font-face" => {
                self.skip_whitespace();
                if self.peek() == &CssToken::LeftBrace {
                    let _ = self.advance();
                    let declarations = self.consume_declarations(diags);
                    sheet.font_faces.push(FontFace { declarations });
                } else {
                    diags.error("css", "@font-face without a block");
                    self.recover_past_block();
                }
            }
            "import" => self.consume_import_rule(medium, diags, loader, sheet),
            "namespace" => {
                let prelude = self.collect_prelude_text();
                if self.peek() == &CssToken::Semicolon {
                    let _ = self.advance();
                }
                if !prelude.is_empty() {
                    sheet.default_namespace = Some(prelude);
                }
            }
            // Frame geometry at-rules carry custom names; anything
            // frame-shaped is forwarded, everything else is skipped
            // with a structured error.
            other if other == "frame" || other.ends_with("-frame") => {
                self.consume_geometry_rule(&name, diags, sheet);
            }
            other => {
                diags.warn("css", &format!("skipping unsupported at-rule @{other}"));
                self.recover_past_block();
            }
        }
    }

    /// `@media <media-list> { <rules> }` — medium filter, then recurse.
    fn consume_media_rule(
        &mut self,
        medium: &str,
        diags: &mut Diagnostics,
        loader: Option<&ImportLoader<'_>>,
        sheet: &mut Stylesheet,
    ) {
        let media_list = self.collect_prelude_text();
        self.skip_whitespace();
        if self.peek() != &CssToken::LeftBrace {
            diags.error(
                "css",
                &FolioError::css_parse(&media_list, "@media without a block").to_string(),
            );
            self.recover_past_block();
            return;
        }
        let _ = self.advance();

        if medium_applies(&media_list, medium) {
            self.consume_rules(medium, diags, loader, sheet);
            if self.peek() == &CssToken::RightBrace {
                let _ = self.advance();
            }
        } else {
            self.skip_block_body();
        }
    }

    /// `@page :first { ... }` / `@pdf-frame content { ... }` — parse the
    /// block declarations and forward the whole thing.
    fn consume_geometry_rule(
        &mut self,
        name: &str,
        diags: &mut Diagnostics,
        sheet: &mut Stylesheet,
    ) {
        let prelude = self.collect_prelude_text();
        self.skip_whitespace();
        if self.peek() != &CssToken::LeftBrace {
            diags.error(
                "css",
                &FolioError::css_parse(&format!("@{name} {prelude}"), "missing block").to_string(),
            );
            self.recover_past_block();
            return;
        }
        let _ = self.advance();
        let declarations = self.consume_declarations(diags);
        sheet.geometry_rules.push(GeometryRule {
            name: name.to_string(),
            prelude,
            declarations,
        });
    }

    /// `@import url(...) [media-list];` — resolve through the loader,
    /// tokenize, and splice the imported rules in place.
    fn consume_import_rule(
        &mut self,
        medium: &str,
        diags: &mut Diagnostics,
        loader: Option<&ImportLoader<'_>>,
        sheet: &mut Stylesheet,
    ) {
        self.skip_whitespace();
        let target = match self.advance() {
            CssToken::Url(url) | CssToken::String(url) => url,
            other => {
                diags.error(
                    "css",
                    &FolioError::css_parse(&other.to_string(), "bad @import target").to_string(),
                );
                self.recover_past_block();
                return;
            }
        };
        let media_list = self.collect_prelude_text();
        if self.peek() == &CssToken::Semicolon {
            let _ = self.advance();
        }
        if !medium_applies(&media_list, medium) {
            return;
        }
        match loader.and_then(|l| l(&target)) {
            Some(source) => {
                let tokens = CssTokenizer::new(&source).run();
                let imported = StylesheetParser::new(tokens).parse(medium, diags, loader);
                sheet.rules.extend(imported.rules);
                sheet.geometry_rules.extend(imported.geometry_rules);
                sheet.font_faces.extend(imported.font_faces);
            }
            None => diags.warn("css", &format!("@import '{target}' not resolved; skipped")),
        }
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-a-qualified-rule)
    fn consume_style_rule(
        &mut self,
        diags: &mut Diagnostics,
    ) -> Result<Option<StyleRule>, FolioError> {
        let selectors = self.consume_selector_list()?;
        if self.peek() != &CssToken::LeftBrace {
            return Err(FolioError::css_parse(
                &self.peek().to_string(),
                "expected '{' after selector list",
            ));
        }
        let _ = self.advance();
        let declarations = self.consume_declarations(diags);
        if selectors.is_empty() {
            return Ok(None);
        }
        Ok(Some(StyleRule {
            selectors,
            declarations,
        }))
    }

    /// Parse a comma-separated selector list up to the opening brace.
    fn consume_selector_list(&mut self) -> Result<Vec<Selector>, FolioError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            let selector = self.consume_selector()?;
            selectors.push(selector);
            self.skip_whitespace();
            match self.peek() {
                CssToken::Comma => {
                    let _ = self.advance();
                }
                _ => return Ok(selectors),
            }
        }
    }

    /// Parse one complex selector. Compounds accumulate in a builder;
    /// on a combinator the accumulated compound becomes the `inner` of
    /// a `Combined` qualifier on the next compound.
    fn consume_selector(&mut self) -> Result<Selector, FolioError> {
        let mut builder = SelectorBuilder::new();
        let mut any = false;
        let mut pending: Option<Combinator> = None;

        loop {
            match self.peek().clone() {
                CssToken::Ident(tag) => {
                    let _ = self.advance();
                    begin_compound(&mut builder, &mut pending, &mut any);
                    builder.set_tag(&tag);
                    any = true;
                }
                CssToken::Delim('*') => {
                    let _ = self.advance();
                    begin_compound(&mut builder, &mut pending, &mut any);
                    any = true;
                }
                CssToken::Hash(id) => {
                    let _ = self.advance();
                    begin_compound(&mut builder, &mut pending, &mut any);
                    builder.push(Qualifier::Id(id));
                    any = true;
                }
                CssToken::Delim('.') => {
                    let _ = self.advance();
                    let CssToken::Ident(class) = self.advance() else {
                        return Err(FolioError::css_parse(".", "expected class name"));
                    };
                    begin_compound(&mut builder, &mut pending, &mut any);
                    builder.push(Qualifier::Class(class));
                    any = true;
                }
                CssToken::Colon => {
                    let _ = self.advance();
                    // Tolerate the double-colon pseudo-element form.
                    if self.peek() == &CssToken::Colon {
                        let _ = self.advance();
                    }
                    let (name, params) = self.consume_pseudo()?;
                    begin_compound(&mut builder, &mut pending, &mut any);
                    builder.push(Qualifier::Pseudo { name, params });
                    any = true;
                }
                CssToken::LeftBracket => {
                    let _ = self.advance();
                    let qualifier = self.consume_attribute_qualifier()?;
                    begin_compound(&mut builder, &mut pending, &mut any);
                    builder.push(qualifier);
                    any = true;
                }
                CssToken::Delim('>') => {
                    let _ = self.advance();
                    self.note_combinator(&mut pending, Combinator::Child, any)?;
                }
                CssToken::Delim('+') => {
                    let _ = self.advance();
                    self.note_combinator(&mut pending, Combinator::AdjacentSibling, any)?;
                }
                CssToken::Whitespace => {
                    let _ = self.advance();
                    // Whitespace is only a combinator when a compound
                    // precedes it and another follows; an explicit
                    // combinator may still override it.
                    if any && pending.is_none() && starts_compound(self.peek()) {
                        pending = Some(Combinator::Descendant);
                    }
                }
                _ => break,
            }
        }

        if !any {
            return Err(FolioError::css_parse(
                &self.peek().to_string(),
                "expected selector",
            ));
        }
        Ok(builder.freeze())
    }


    fn note_combinator(
        &mut self,
        pending: &mut Option<Combinator>,
        combinator: Combinator,
        any: bool,
    ) -> Result<(), FolioError> {
        if !any {
            return Err(FolioError::css_parse(
                "combinator",
                "combinator without left-hand side",
            ));
        }
        *pending = Some(combinator);
        self.skip_whitespace();
        Ok(())
    }

    /// `:name` or `:name(raw params)`.
    fn consume_pseudo(&mut self) -> Result<(String, String), FolioError> {
        let name = match self.advance() {
            CssToken::Ident(name) => name.to_ascii_lowercase(),
            CssToken::Function(name) => {
                let mut params = String::new();
                let mut depth = 1u32;
                loop {
                    match self.advance() {
                        CssToken::LeftParen => {
                            depth += 1;
                            params.push('(');
                        }
                        CssToken::RightParen => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            params.push(')');
                        }
                        CssToken::Eof => {
                            return Err(FolioError::css_parse(&name, "unterminated pseudo"));
                        }
                        token => params.push_str(&token.to_string()),
                    }
                }
                return Ok((name.to_ascii_lowercase(), params.trim().to_string()));
            }
            other => {
                return Err(FolioError::css_parse(
                    &other.to_string(),
                    "expected pseudo-class name",
                ));
            }
        };
        Ok((name, String::new()))
    }

    /// `[name]`, `[name=v]`, `[name~=v]`, `[name|=v]` — stream is past
    /// the opening bracket.
    fn consume_attribute_qualifier(&mut self) -> Result<Qualifier, FolioError> {
        self.skip_whitespace();
        let CssToken::Ident(name) = self.advance() else {
            return Err(FolioError::css_parse("[", "expected attribute name"));
        };
        self.skip_whitespace();

        let op = match self.peek() {
            CssToken::RightBracket => {
                let _ = self.advance();
                return Ok(Qualifier::Attribute {
                    name,
                    op: AttrOp::Exists,
                    value: None,
                });
            }
            CssToken::Delim('=') => {
                let _ = self.advance();
                AttrOp::Equals
            }
            CssToken::Delim('~') => {
                let _ = self.advance();
                self.expect_delim('=')?;
                AttrOp::Includes
            }
            CssToken::Delim('|') => {
                let _ = self.advance();
                self.expect_delim('=')?;
                AttrOp::DashMatch
            }
            other => {
                return Err(FolioError::css_parse(
                    &other.to_string(),
                    "bad attribute operator",
                ));
            }
        };

        self.skip_whitespace();
        let value = match self.advance() {
            CssToken::Ident(v) | CssToken::String(v) => v,
            other => {
                return Err(FolioError::css_parse(
                    &other.to_string(),
                    "expected attribute value",
                ));
            }
        };
        self.skip_whitespace();
        if self.advance() != CssToken::RightBracket {
            return Err(FolioError::css_parse(&name, "unterminated attribute selector"));
        }
        Ok(Qualifier::Attribute {
            name,
            op,
            value: Some(value),
        })
    }

    fn expect_delim(&mut self, expected: char) -> Result<(), FolioError> {
        match self.advance() {
            CssToken::Delim(c) if c == expected => Ok(()),
            other => Err(FolioError::css_parse(
                &other.to_string(),
                "expected '='",
            )),
        }
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    ///
    /// The stream is past the opening brace; consumes through the
    /// closing brace.
    fn consume_declarations(&mut self, diags: &mut Diagnostics) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek().clone() {
                CssToken::RightBrace | CssToken::Eof => {
                    let _ = self.advance();
                    return declarations;
                }
                CssToken::Semicolon => {
                    let _ = self.advance();
                }
                CssToken::Ident(property) => {
                    let _ = self.advance();
                    match self.consume_declaration_value(&property) {
                        Ok(declaration) => declarations.push(declaration),
                        Err(err) => {
                            diags.error("css", &err.to_string());
                            self.recover_past_semicolon();
                        }
                    }
                }
                other => {
                    diags.error(
                        "css",
                        &FolioError::css_parse(&other.to_string(), "expected property name")
                            .to_string(),
                    );
                    self.recover_past_semicolon();
                }
            }
        }
    }

    /// `: <values> [!important]` after the property name.
    fn consume_declaration_value(&mut self, property: &str) -> Result<Declaration, FolioError> {
        self.skip_whitespace();
        if self.advance() != CssToken::Colon {
            return Err(FolioError::css_parse(property, "expected ':'"));
        }

        let mut values: Vec<Value> = Vec::new();
        let mut important = false;
        loop {
            self.skip_whitespace();
            match self.peek().clone() {
                CssToken::Semicolon | CssToken::RightBrace | CssToken::Eof => break,
                CssToken::Comma => {
                    let _ = self.advance();
                }
                CssToken::Delim('!') => {
                    let _ = self.advance();
                    self.skip_whitespace();
                    match self.advance() {
                        CssToken::Ident(flag) if flag.eq_ignore_ascii_case("important") => {
                            important = true;
                        }
                        other => {
                            return Err(FolioError::css_parse(
                                &other.to_string(),
                                "expected 'important' after '!'",
                            ));
                        }
                    }
                }
                CssToken::Function(name) => {
                    let _ = self.advance();
                    values.push(self.consume_function(&name)?);
                }
                token => {
                    let _ = self.advance();
                    match token_to_value(&token) {
                        Some(value) => values.push(value),
                        None => {
                            return Err(FolioError::css_parse(
                                &token.to_string(),
                                "unexpected token in value",
                            ));
                        }
                    }
                }
            }
        }

        let value = match values.len() {
            0 => {
                return Err(FolioError::css_parse(property, "empty declaration value"));
            }
            1 => values.remove(0),
            _ => Value::List(values),
        };
        Ok(Declaration {
            property: property.to_ascii_lowercase(),
            value,
            important,
        })
    }

    /// A function value; `rgb`/`rgba` resolve to colors at parse time.
    fn consume_function(&mut self, name: &str) -> Result<Value, FolioError> {
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.advance() {
                CssToken::RightParen => break,
                CssToken::Comma => {}
                CssToken::Eof => {
                    return Err(FolioError::css_parse(name, "unterminated function"));
                }
                CssToken::Function(inner) => args.push(self.consume_function(&inner)?),
                token => {
                    if let Some(value) = token_to_value(&token) {
                        args.push(value);
                    }
                }
            }
        }
        if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") {
            if let Some(color) = parse_rgb_function(&args) {
                return Ok(Value::Color(color));
            }
        }
        Ok(Value::Function {
            name: name.to_ascii_lowercase(),
            args,
        })
    }

    /// Collect raw prelude text (for at-rules) up to `{`, `;` or EOF.
    fn collect_prelude_text(&mut self) -> String {
        let mut text = String::new();
        loop {
            match self.peek() {
                CssToken::LeftBrace | CssToken::Semicolon | CssToken::Eof => break,
                token => {
                    text.push_str(&token.to_string());
                    let _ = self.advance();
                }
            }
        }
        text.trim().to_string()
    }

    /// Error recovery: skip to the end of the current rule — past the
    /// next block if one opens, else past the next semicolon.
    fn recover_past_block(&mut self) {
        loop {
            match self.advance() {
                CssToken::Semicolon | CssToken::Eof => return,
                CssToken::LeftBrace => {
                    self.skip_block_body();
                    return;
                }
                _ => {}
            }
        }
    }

    fn recover_past_semicolon(&mut self) {
        loop {
            match self.peek() {
                CssToken::RightBrace | CssToken::Eof => return,
                CssToken::Semicolon => {
                    let _ = self.advance();
                    return;
                }
                _ => {
                    let _ = self.advance();
                }
            }
        }
    }

    /// Skip a block body with balanced braces; the stream is past the
    /// opening brace.
    fn skip_block_body(&mut self) {
        let mut depth = 1u32;
        loop {
            match self.advance() {
                CssToken::LeftBrace => depth += 1,
                CssToken::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                CssToken::Eof => return,
                _ => {}
            }
        }
    }
}

/// Handle a pending combinator at the start of a new compound: the
/// compound built so far becomes the inner selector of a `Combined`
/// qualifier on the restarted builder.
fn begin_compound(builder: &mut SelectorBuilder, pending: &mut Option<Combinator>, any: &mut bool) {
    if let Some(combinator) = pending.take() {
        let inner = builder.take_as_inner();
        builder.push(Qualifier::Combined {
            combinator,
            inner: Box::new(inner),
        });
        *any = false;
    }
}

/// Whether a token can start a selector compound.
const fn starts_compound(token: &CssToken) -> bool {
    matches!(
        token,
        CssToken::Ident(_)
            | CssToken::Hash(_)
            | CssToken::Colon
            | CssToken::LeftBracket
            | CssToken::Delim('.' | '*')
    )
}

/// Whether a media list admits the given medium. An empty list and the
/// `all` keyword always apply.
fn medium_applies(media_list: &str, medium: &str) -> bool {
    let trimmed = media_list.trim();
    if trimmed.is_empty() {
        return true;
    }
    trimmed
        .split(',')
        .map(str::trim)
        .any(|m| m.eq_ignore_ascii_case("all") || m.eq_ignore_ascii_case(medium))
}

/// Parse the contents of a `style` attribute into declarations.
///
/// Used by the cascade engine when it lifts inline declarations into
/// the inline origin.
#[must_use]
pub fn parse_inline_declarations(style_attr: &str, diags: &mut Diagnostics) -> Vec<Declaration> {
    // Wrap in braces so the declaration consumer sees a normal block.
    let tokens = CssTokenizer::new(&format!("{style_attr}}}")).run();
    let mut parser = StylesheetParser::new(tokens);
    parser.consume_declarations(diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Rgba, Unit};

    fn parse(css: &str) -> (Stylesheet, Diagnostics) {
        let mut diags = Diagnostics::new();
        let tokens = CssTokenizer::new(css).run();
        let sheet = StylesheetParser::new(tokens).parse("all", &mut diags, None);
        (sheet, diags)
    }

    #[test]
    fn test_simple_rule() {
        let (sheet, _) = parse("p { color: red; }");
        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 1);
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "color");
        assert!(!rule.declarations[0].important);
    }

    #[test]
    fn test_important_flag() {
        let (sheet, _) = parse("p { color: red !important; }");
        assert!(sheet.rules[0].declarations[0].important);
    }

    #[test]
    fn test_selector_list_shares_declarations() {
        let (sheet, _) = parse("h1, h2, .title { font-weight: bold; }");
        assert_eq!(sheet.rules[0].selectors.len(), 3);
    }

    #[test]
    fn test_rgb_function_resolves_to_color() {
        let (sheet, _) = parse("p { color: rgb(37, 99, 235); }");
        assert_eq!(
            sheet.rules[0].declarations[0].value,
            Value::Color(Rgba::rgb(37, 99, 235))
        );
    }

    #[test]
    fn test_media_filter_drops_screen_for_print() {
        let css = "@media screen { p { color: red; } } @media print { p { color: blue; } }";
        let mut diags = Diagnostics::new();
        let tokens = CssTokenizer::new(css).run();
        let sheet = StylesheetParser::new(tokens).parse("print", &mut diags, None);
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(
            sheet.rules[0].declarations[0].value.as_color(),
            Some(Rgba::rgb(0, 0, 255))
        );
    }

    #[test]
    fn test_page_rule_forwarded() {
        let (sheet, _) = parse("@page :first { margin: 2cm; } p { color: red; }");
        assert_eq!(sheet.geometry_rules.len(), 1);
        assert_eq!(sheet.geometry_rules[0].name, "page");
        assert_eq!(sheet.geometry_rules[0].prelude, ":first");
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn test_malformed_rule_skipped_scan_continues() {
        let (sheet, diags) = parse("p { color: red; } ~~garbage~~ { x } h1 { font-size: 24pt; }");
        assert_eq!(sheet.rules.len(), 2);
        assert!(diags.has_at_least(folio_common::Severity::Error));
    }

    #[test]
    fn test_import_without_loader_warns() {
        let (sheet, diags) = parse("@import url(other.css); p { color: red; }");
        assert_eq!(sheet.rules.len(), 1);
        assert!(diags.has_at_least(folio_common::Severity::Warning));
    }

    #[test]
    fn test_import_with_loader_splices_rules() {
        let css = "@import url(base.css); p { color: red; }";
        let mut diags = Diagnostics::new();
        let tokens = CssTokenizer::new(css).run();
        let loader = |target: &str| {
            (target == "base.css").then(|| "body { margin: 0; }".to_string())
        };
        let sheet = StylesheetParser::new(tokens).parse("all", &mut diags, Some(&loader));
        assert_eq!(sheet.rules.len(), 2);
    }

    #[test]
    fn test_font_face_collected() {
        let (sheet, _) = parse("@font-face { font-family: Custom; src: url(custom.ttf); }");
        assert_eq!(sheet.font_faces.len(), 1);
        assert_eq!(sheet.font_faces[0].declarations.len(), 2);
    }

    #[test]
    fn test_dimension_value_units() {
        let (sheet, _) = parse("p { font-size: 12pt; }");
        assert_eq!(
            sheet.rules[0].declarations[0].value,
            Value::Number {
                value: 12.0,
                unit: Some(Unit::Pt)
            }
        );
    }

    #[test]
    fn test_default_namespace_applied_to_following_selectors() {
        let (sheet, _) = parse("p { color: red; } @namespace pdf; h1 { color: blue; }");
        assert_eq!(sheet.default_namespace.as_deref(), Some("pdf"));
        // Only rules after the declaration pick up the namespace gate.
        assert_eq!(sheet.rules[0].selectors[0].namespace(), None);
        assert_eq!(sheet.rules[1].selectors[0].namespace(), Some("pdf"));
    }

    #[test]
    fn test_capacity_guard() {
        let source = StylesheetSource::with_capacity("p { color: red; }", 4);
        assert!(matches!(
            source.tokenize(),
            Err(FolioError::CapacityExceeded { capacity: 4 })
        ));
        let ok = StylesheetSource::with_capacity("p{}", 1024);
        assert!(ok.tokenize().is_ok());
    }

    #[test]
    fn test_inline_declarations() {
        let mut diags = Diagnostics::new();
        let decls = parse_inline_declarations("color: red; font-size: 10pt", &mut diags);
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
    }
}
