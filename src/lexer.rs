//! Tokenizer for the search query grammar.
//!
//! Ordered rule list evaluated at each byte position; the first matching
//! rule consumes its match. Whitespace and unrecognized characters are
//! skipped without producing tokens, so downstream context detection can
//! recover from partially typed input.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Reserved words
    Or,
    And,
    Not,
    In,
    StartsWith,
    EndsWith,
    True,
    False,
    None,
    // Punctuation
    Comma,
    Dot,
    ParenL,
    ParenR,
    // Comparison operators
    Equals,
    NotEquals,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Contains,
    NotContains,
    // Values
    Name,
    StringValue,
    IntValue,
    FloatValue,
}

impl TokenKind {
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::Contains
                | Self::NotContains
                | Self::Greater
                | Self::GreaterEqual
                | Self::Less
                | Self::LessEqual
        )
    }

    /// Token kinds that can end a complete comparison expression.
    pub fn ends_expression(self) -> bool {
        matches!(
            self,
            Self::ParenR | Self::IntValue | Self::FloatValue | Self::StringValue
        )
    }
}

/// A lexical token with byte offsets into the analyzed text.
///
/// For STRING_VALUE the surrounding quotes are stripped from `value` but
/// still counted in the `start..end` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

const RESERVED_WORDS: &[(&str, TokenKind)] = &[
    ("or", TokenKind::Or),
    ("and", TokenKind::And),
    ("not", TokenKind::Not),
    ("in", TokenKind::In),
    ("startswith", TokenKind::StartsWith),
    ("endswith", TokenKind::EndsWith),
    ("True", TokenKind::True),
    ("False", TokenKind::False),
    ("None", TokenKind::None),
];

// Two-character operators must come before their one-character prefixes.
const PUNCTUATION: &[(&str, TokenKind)] = &[
    ("!=", TokenKind::NotEquals),
    ("!~", TokenKind::NotContains),
    (">=", TokenKind::GreaterEqual),
    ("<=", TokenKind::LessEqual),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    ("(", TokenKind::ParenL),
    (")", TokenKind::ParenR),
    ("=", TokenKind::Equals),
    (">", TokenKind::Greater),
    ("<", TokenKind::Less),
    ("~", TokenKind::Contains),
];

fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Lazy token stream over a query string. Restartable: construct a new
/// `Lexer` at any time; there is no cross-call state.
pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Eagerly tokenizes `text`. Convenience for callers that need the
    /// whole token list up front.
    pub fn tokenize(text: &str) -> Vec<Token> {
        Lexer::new(text).collect()
    }

    fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn match_punctuation(&self) -> Option<Token> {
        let rest = &self.text[self.pos..];
        for (pat, kind) in PUNCTUATION {
            if rest.starts_with(pat) {
                return Some(Token {
                    kind: *kind,
                    value: (*pat).to_string(),
                    start: self.pos,
                    end: self.pos + pat.len(),
                });
            }
        }
        Option::None
    }

    fn match_reserved(&self) -> Option<Token> {
        let rest = &self.text[self.pos..];
        for (word, kind) in RESERVED_WORDS {
            if rest.starts_with(word) {
                // Reserved only when not immediately followed by a name
                // character ("orange" is a NAME, not OR + "ange").
                let next = self.bytes().get(self.pos + word.len()).copied();
                if next.is_none_or(|c| !is_name_char(c)) {
                    return Some(Token {
                        kind: *kind,
                        value: (*word).to_string(),
                        start: self.pos,
                        end: self.pos + word.len(),
                    });
                }
            }
        }
        Option::None
    }

    fn match_name(&self) -> Option<Token> {
        let bytes = self.bytes();
        if !is_name_start(bytes[self.pos]) {
            return Option::None;
        }
        let mut end = self.pos + 1;
        while end < bytes.len() && is_name_char(bytes[end]) {
            end += 1;
        }
        // Dotted continuation: `.identifier` chains extend the NAME.
        while end < bytes.len()
            && bytes[end] == b'.'
            && bytes.get(end + 1).copied().is_some_and(is_name_start)
        {
            end += 2;
            while end < bytes.len() && is_name_char(bytes[end]) {
                end += 1;
            }
        }
        Some(Token {
            kind: TokenKind::Name,
            value: self.text[self.pos..end].to_string(),
            start: self.pos,
            end,
        })
    }

    fn match_string(&self) -> Option<Token> {
        let bytes = self.bytes();
        if bytes[self.pos] != b'"' {
            return Option::None;
        }
        let mut i = self.pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'"' => {
                    return Some(Token {
                        kind: TokenKind::StringValue,
                        value: self.text[self.pos + 1..i].to_string(),
                        start: self.pos,
                        end: i + 1,
                    });
                }
                b'\\' => {
                    match bytes.get(i + 1) {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => i += 2,
                        Some(b'u') => {
                            let hex = bytes.get(i + 2..i + 6)?;
                            if !hex.iter().all(u8::is_ascii_hexdigit) {
                                return Option::None;
                            }
                            i += 6;
                        }
                        // Invalid escape: the whole rule fails and the
                        // opening quote is skipped as unrecognized.
                        _ => return Option::None,
                    }
                }
                _ => {
                    // Multi-byte UTF-8 sequences pass through untouched.
                    i += 1;
                }
            }
        }
        // Unterminated string.
        Option::None
    }

    /// Matches the integer-literal part shared by INT and FLOAT rules:
    /// optional `-`, then `0` or a non-zero digit run. Returns the end
    /// offset, or `None` if no integer starts here.
    fn match_integer_part(&self) -> Option<usize> {
        let bytes = self.bytes();
        let mut i = self.pos;
        if bytes[i] == b'-' {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'0') => Some(i + 1),
            Some(c) if c.is_ascii_digit() => {
                let mut end = i + 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                Some(end)
            }
            _ => Option::None,
        }
    }

    fn match_number(&self) -> Option<Token> {
        let bytes = self.bytes();
        let int_end = self.match_integer_part()?;
        let mut end = int_end;
        let mut is_float = false;

        // Fraction: `.` followed by at least one digit.
        if bytes.get(end) == Some(&b'.')
            && bytes.get(end + 1).copied().is_some_and(|c| c.is_ascii_digit())
        {
            end += 2;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            is_float = true;
        }

        // Exponent: `e`/`E`, optional sign, at least one digit.
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            if bytes.get(exp).copied().is_some_and(|c| c.is_ascii_digit()) {
                end = exp + 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                is_float = true;
            }
        }

        let kind = if is_float {
            TokenKind::FloatValue
        } else {
            TokenKind::IntValue
        };
        Some(Token {
            kind,
            value: self.text[self.pos..end].to_string(),
            start: self.pos,
            end,
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() {
            let c = bytes[self.pos];

            if c.is_ascii_whitespace() {
                self.pos += 1;
                continue;
            }

            // `-` can start a number; try the number rule before treating
            // the position as unrecognized.
            if c == b'-' || c.is_ascii_digit() {
                if let Some(token) = self.match_number() {
                    self.pos = token.end;
                    return Some(token);
                }
            }

            if let Some(token) = self.match_punctuation() {
                self.pos = token.end;
                return Some(token);
            }

            if is_name_start(c) {
                if let Some(token) = self.match_reserved() {
                    self.pos = token.end;
                    return Some(token);
                }
                if let Some(token) = self.match_name() {
                    self.pos = token.end;
                    return Some(token);
                }
            }

            if c == b'"' {
                if let Some(token) = self.match_string() {
                    self.pos = token.end;
                    return Some(token);
                }
            }

            // Unrecognized character: skip silently, prefix detection
            // recovers downstream.
            self.pos += 1;
            while self.pos < bytes.len() && !self.text.is_char_boundary(self.pos) {
                self.pos += 1;
            }
        }
        Option::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::tokenize(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_comparison() {
        let tokens = Lexer::tokenize("id > 1");

        assert_eq!(
            tokens
                .iter()
                .map(|t| (t.kind, t.value.as_str()))
                .collect::<Vec<_>>(),
            vec![
                (TokenKind::Name, "id"),
                (TokenKind::Greater, ">"),
                (TokenKind::IntValue, "1"),
            ]
        );
    }

    #[test]
    fn offsets_cover_adjacent_spans() {
        let text = "name = \"John\" and age >= 21";
        let tokens = Lexer::tokenize(text);

        // Re-concatenating token spans plus skipped gaps reproduces the
        // input bytes.
        let mut rebuilt = String::new();
        let mut pos = 0;
        for token in &tokens {
            rebuilt.push_str(&text[pos..token.start]);
            rebuilt.push_str(&text[token.start..token.end]);
            pos = token.end;
        }
        rebuilt.push_str(&text[pos..]);

        assert_eq!(rebuilt, text);
        for pair in tokens.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[rstest]
    #[case("or", TokenKind::Or)]
    #[case("and", TokenKind::And)]
    #[case("not", TokenKind::Not)]
    #[case("in", TokenKind::In)]
    #[case("startswith", TokenKind::StartsWith)]
    #[case("endswith", TokenKind::EndsWith)]
    #[case("True", TokenKind::True)]
    #[case("False", TokenKind::False)]
    #[case("None", TokenKind::None)]
    fn reserved_words(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(text), vec![expected]);
    }

    #[rstest]
    #[case("orange")]
    #[case("android")]
    #[case("interest")]
    #[case("Truediness")]
    fn reserved_word_prefix_is_a_name(#[case] text: &str) {
        assert_eq!(kinds(text), vec![TokenKind::Name]);
    }

    #[test]
    fn dotted_name_is_one_token() {
        let tokens = Lexer::tokenize("author.groups.user");

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Name);
        assert_eq!(tokens[0].value, "author.groups.user");
    }

    #[test]
    fn trailing_dot_is_separate() {
        let tokens = Lexer::tokenize("author.");

        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Name, TokenKind::Dot]
        );
        assert_eq!(tokens[0].value, "author");
    }

    #[test]
    fn string_value_strips_quotes() {
        let tokens = Lexer::tokenize("\"hello world\"");

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::StringValue);
        assert_eq!(tokens[0].value, "hello world");
        assert_eq!((tokens[0].start, tokens[0].end), (0, 13));
    }

    #[rstest]
    #[case(r#""a\"b""#, r#"a\"b"#)]
    #[case(r#""tab\there""#, "tab\\there")]
    #[case(r#""\u00e9""#, "\\u00e9")]
    fn string_escapes_kept_raw(#[case] text: &str, #[case] expected: &str) {
        let tokens = Lexer::tokenize(text);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, expected);
    }

    #[test]
    fn unterminated_string_skips_quote() {
        // The opening quote is dropped; the rest tokenizes normally so
        // the in-progress value is still visible to prefix detection.
        let tokens = Lexer::tokenize("name = \"Jo");

        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Name, TokenKind::Equals, TokenKind::Name]
        );
        assert_eq!(tokens[2].value, "Jo");
    }

    #[rstest]
    #[case("0", TokenKind::IntValue)]
    #[case("-7", TokenKind::IntValue)]
    #[case("42", TokenKind::IntValue)]
    #[case("3.5", TokenKind::FloatValue)]
    #[case("-0.25", TokenKind::FloatValue)]
    #[case("1e10", TokenKind::FloatValue)]
    #[case("2.5e-3", TokenKind::FloatValue)]
    fn number_literals(#[case] text: &str, #[case] expected: TokenKind) {
        let tokens = Lexer::tokenize(text);

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, expected);
        assert_eq!(tokens[0].value, text);
    }

    #[test]
    fn leading_zero_splits() {
        // No leading zeros: "01" lexes as 0 then 1.
        assert_eq!(kinds("01"), vec![TokenKind::IntValue, TokenKind::IntValue]);
    }

    #[rstest]
    #[case("=", TokenKind::Equals)]
    #[case("!=", TokenKind::NotEquals)]
    #[case("~", TokenKind::Contains)]
    #[case("!~", TokenKind::NotContains)]
    #[case(">", TokenKind::Greater)]
    #[case(">=", TokenKind::GreaterEqual)]
    #[case("<", TokenKind::Less)]
    #[case("<=", TokenKind::LessEqual)]
    fn comparison_operators(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(text), vec![expected]);
        assert!(expected.is_comparison());
    }

    #[test]
    fn unrecognized_characters_are_skipped() {
        assert_eq!(kinds("id @# > $ 1"), vec![
            TokenKind::Name,
            TokenKind::Greater,
            TokenKind::IntValue,
        ]);
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        let tokens = Lexer::tokenize("name ~ \"héllo\" and état");

        assert!(tokens.iter().any(|t| t.value == "héllo"));
    }

    #[test]
    fn restartable_iterator() {
        let mut lexer = Lexer::new("a = 1");
        assert_eq!(lexer.next().map(|t| t.kind), Some(TokenKind::Name));

        // A fresh lexer on the same text starts over.
        let mut fresh = Lexer::new("a = 1");
        assert_eq!(fresh.next().map(|t| t.kind), Some(TokenKind::Name));
    }

    #[test]
    fn grouped_expression() {
        assert_eq!(kinds("(id = 1) and name in (\"a\", \"b\")"), vec![
            TokenKind::ParenL,
            TokenKind::Name,
            TokenKind::Equals,
            TokenKind::IntValue,
            TokenKind::ParenR,
            TokenKind::And,
            TokenKind::Name,
            TokenKind::In,
            TokenKind::ParenL,
            TokenKind::StringValue,
            TokenKind::Comma,
            TokenKind::StringValue,
            TokenKind::ParenR,
        ]);
    }
}
