//! CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! "The input to the tokenization stage is a stream of code points."
//! Comments are consumed and discarded during tokenization; runs of
//! whitespace collapse to a single `<whitespace-token>`.

use super::token::CssToken;

/// Streaming CSS tokenizer over an in-memory source string.
pub struct CssTokenizer {
    input: Vec<char>,
    pos: usize,
    tokens: Vec<CssToken>,
}

impl CssTokenizer {
    /// Create a tokenizer over the given CSS source.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            input: source.chars().collect(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input and return the token stream, terminated
    /// by [`CssToken::Eof`].
    #[must_use]
    pub fn run(mut self) -> Vec<CssToken> {
        loop {
            let token = self.consume_token();
            let done = token.is_eof();
            self.tokens.push(token);
            if done {
                break;
            }
        }
        self.tokens
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// [§ 4.3.1 Consume a token](https://www.w3.org/TR/css-syntax-3/#consume-token)
    fn consume_token(&mut self) -> CssToken {
        self.consume_comments();

        let Some(c) = self.peek() else {
            return CssToken::Eof;
        };

        match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(char::is_whitespace) {
                    let _ = self.advance();
                }
                CssToken::Whitespace
            }
            '"' | '\'' => self.consume_string(c),
            '#' => {
                let _ = self.advance();
                if self.peek().is_some_and(is_ident_char) {
                    CssToken::Hash(self.consume_ident_sequence())
                } else {
                    CssToken::Delim('#')
                }
            }
            '(' => self.single(CssToken::LeftParen),
            ')' => self.single(CssToken::RightParen),
            '[' => self.single(CssToken::LeftBracket),
            ']' => self.single(CssToken::RightBracket),
            '{' => self.single(CssToken::LeftBrace),
            '}' => self.single(CssToken::RightBrace),
            ':' => self.single(CssToken::Colon),
            ';' => self.single(CssToken::Semicolon),
            ',' => self.single(CssToken::Comma),
            '<' if self.lookahead_is("<!--") => {
                self.pos += 4;
                CssToken::Cdo
            }
            '-' if self.lookahead_is("-->") => {
                self.pos += 3;
                CssToken::Cdc
            }
            '+' | '-' | '.' if self.starts_number() => self.consume_numeric(),
            c if c.is_ascii_digit() => self.consume_numeric(),
            '@' => {
                let _ = self.advance();
                if self.peek().is_some_and(is_ident_start_char) {
                    CssToken::AtKeyword(self.consume_ident_sequence())
                } else {
                    CssToken::Delim('@')
                }
            }
            c if is_ident_start_char(c) => self.consume_ident_like(),
            _ => {
                let _ = self.advance();
                CssToken::Delim(c)
            }
        }
    }

    fn single(&mut self, token: CssToken) -> CssToken {
        let _ = self.advance();
        token
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comments)
    fn consume_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            self.pos += 2;
            while self.pos < self.input.len() {
                if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                    self.pos += 2;
                    break;
                }
                self.pos += 1;
            }
        }
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    fn consume_string(&mut self, quote: char) -> CssToken {
        let _ = self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return CssToken::String(value),
                // "This is a parse error. Reconsume... return a <bad-string-token>."
                Some('\n') => return CssToken::Bad,
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        // Escaped newline is a line continuation.
                        if escaped != '\n' {
                            value.push(escaped);
                        }
                    }
                }
                Some(c) => value.push(c),
                None => return CssToken::String(value),
            }
        }
    }

    /// Check whether the stream starts a number (`+.5`, `-2`, `.7`, `3`).
    fn starts_number(&self) -> bool {
        match self.peek() {
            Some('+' | '-') => match self.peek_at(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('.') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            },
            Some('.') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    /// [§ 4.3.3 Consume a numeric token](https://www.w3.org/TR/css-syntax-3/#consume-numeric-token)
    fn consume_numeric(&mut self) -> CssToken {
        let mut text = String::new();
        if matches!(self.peek(), Some('+' | '-')) {
            text.push(self.advance().unwrap_or('+'));
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                text.push(c);
                let _ = self.advance();
            } else {
                break;
            }
        }
        let value: f64 = text.parse().unwrap_or(0.0);

        if self.peek() == Some('%') {
            let _ = self.advance();
            return CssToken::Percentage(value);
        }
        if self.peek().is_some_and(is_ident_start_char) {
            let unit = self.consume_ident_sequence();
            return CssToken::Dimension { value, unit };
        }
        CssToken::Number(value)
    }

    /// [§ 4.3.4 Consume an ident-like token](https://www.w3.org/TR/css-syntax-3/#consume-ident-like-token)
    fn consume_ident_like(&mut self) -> CssToken {
        let name = self.consume_ident_sequence();
        if self.peek() == Some('(') {
            let _ = self.advance();
            if name.eq_ignore_ascii_case("url") {
                return self.consume_url();
            }
            return CssToken::Function(name);
        }
        CssToken::Ident(name)
    }

    /// [§ 4.3.6 Consume a url token](https://www.w3.org/TR/css-syntax-3/#consume-url-token)
    ///
    /// Called with the stream positioned just after `url(`. Quoted
    /// payloads re-use the string consumer; unquoted payloads run to the
    /// closing paren.
    fn consume_url(&mut self) -> CssToken {
        while self.peek().is_some_and(char::is_whitespace) {
            let _ = self.advance();
        }
        if let Some(q @ ('"' | '\'')) = self.peek() {
            let inner = self.consume_string(q);
            while self.peek().is_some_and(char::is_whitespace) {
                let _ = self.advance();
            }
            if self.peek() == Some(')') {
                let _ = self.advance();
            }
            return match inner {
                CssToken::String(value) => CssToken::Url(value),
                _ => CssToken::Bad,
            };
        }
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(')') | None => break,
                Some(c) if c.is_whitespace() => {
                    while self.peek().is_some_and(char::is_whitespace) {
                        let _ = self.advance();
                    }
                    if self.peek() == Some(')') {
                        let _ = self.advance();
                    }
                    break;
                }
                Some(c) => value.push(c),
            }
        }
        CssToken::Url(value)
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    fn consume_ident_sequence(&mut self) -> String {
        let mut name = String::new();
        while self.peek().is_some_and(is_ident_char) {
            if let Some(c) = self.advance() {
                name.push(c);
            }
        }
        name
    }
}

/// [§ 4.3.10 ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(css: &str) -> Vec<CssToken> {
        CssTokenizer::new(css).run()
    }

    #[test]
    fn test_simple_rule_tokens() {
        let tokens = tokenize("p { color: red; }");
        assert_eq!(tokens[0], CssToken::Ident("p".to_string()));
        assert!(tokens.contains(&CssToken::LeftBrace));
        assert!(tokens.contains(&CssToken::Colon));
        assert!(tokens.contains(&CssToken::Ident("red".to_string())));
        assert_eq!(tokens.last(), Some(&CssToken::Eof));
    }

    #[test]
    fn test_dimension_and_percentage() {
        let tokens = tokenize("margin: 2.5cm 50%;");
        assert!(tokens.contains(&CssToken::Dimension {
            value: 2.5,
            unit: "cm".to_string()
        }));
        assert!(tokens.contains(&CssToken::Percentage(50.0)));
    }

    #[test]
    fn test_negative_number() {
        let tokens = tokenize("-4pt");
        assert_eq!(
            tokens[0],
            CssToken::Dimension {
                value: -4.0,
                unit: "pt".to_string()
            }
        );
    }

    #[test]
    fn test_hash_token() {
        let tokens = tokenize("#ff0000");
        assert_eq!(tokens[0], CssToken::Hash("ff0000".to_string()));
    }

    #[test]
    fn test_url_unquoted_and_quoted() {
        let tokens = tokenize("url(img/a.png) url(\"b.png\")");
        assert!(tokens.contains(&CssToken::Url("img/a.png".to_string())));
        assert!(tokens.contains(&CssToken::Url("b.png".to_string())));
    }

    #[test]
    fn test_comments_discarded() {
        let tokens = tokenize("/* note */ p /* x */ {}");
        // Whitespace around a comment still tokenizes; the comment text
        // itself never reaches the stream.
        let significant: Vec<_> = tokens.iter().filter(|t| !t.is_whitespace()).collect();
        assert_eq!(significant[0], &CssToken::Ident("p".to_string()));
        assert_eq!(significant[1], &CssToken::LeftBrace);
        assert!(!tokens.iter().any(|t| t.to_string().contains("note")));
    }

    #[test]
    fn test_at_keyword_and_function() {
        let tokens = tokenize("@media print { a { color: rgb(1, 2, 3); } }");
        assert_eq!(tokens[0], CssToken::AtKeyword("media".to_string()));
        assert!(tokens.contains(&CssToken::Function("rgb".to_string())));
    }

    #[test]
    fn test_unterminated_string_is_bad_on_newline() {
        let tokens = tokenize("content: \"abc\ndef\";");
        assert!(tokens.contains(&CssToken::Bad));
    }
}
