//! Token types for the nginx configuration lexer

use std::fmt;

/// A token in the nginx configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token class
    pub kind: TokenKind,
    /// The raw text of the token
    ///
    /// Quoted strings keep their surrounding delimiters (with escapes
    /// decoded), variables keep their `$`, comments keep their `#`.
    pub literal: String,
    /// Line of the token's first character (1-indexed)
    pub line: usize,
    /// Column of the token's first character (1-indexed)
    pub column: usize,
}

impl Token {
    /// Create a new token
    #[must_use]
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    /// Check the token's kind
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Whether the token may appear as a directive argument
    #[must_use]
    pub fn is_parameter_eligible(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Keyword | TokenKind::QuotedString | TokenKind::Variable | TokenKind::Regex
        )
    }
}

/// Token classes in nginx configuration syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input
    Eof,
    /// Bare word: directive names and unquoted arguments
    Keyword,
    /// Quoted string: `"…"`, `'…'` or `` `…` ``
    QuotedString,
    /// Variable reference: `$host`
    Variable,
    /// Opening brace `{`
    BlockStart,
    /// Closing brace `}`
    BlockEnd,
    /// Statement terminator `;`
    Semicolon,
    /// Comment from `#` to end of line
    Comment,
    /// A byte sequence the lexer could not classify
    Illegal,
    /// Regex argument (`location ~ …` patterns are lexed as keywords; the
    /// kind exists so callers can tag them without re-lexing)
    Regex,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "end of file",
            Self::Keyword => "keyword",
            Self::QuotedString => "quoted string",
            Self::Variable => "variable",
            Self::BlockStart => "'{'",
            Self::BlockEnd => "'}'",
            Self::Semicolon => "';'",
            Self::Comment => "comment",
            Self::Illegal => "illegal token",
            Self::Regex => "regex",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new(TokenKind::Keyword, "server", 1, 1);
        assert_eq!(token.kind, TokenKind::Keyword);
        assert_eq!(token.literal, "server");
        assert!(token.is(TokenKind::Keyword));
    }

    #[test]
    fn test_parameter_eligibility() {
        assert!(Token::new(TokenKind::Keyword, "80", 1, 1).is_parameter_eligible());
        assert!(Token::new(TokenKind::QuotedString, "\"x\"", 1, 1).is_parameter_eligible());
        assert!(Token::new(TokenKind::Variable, "$host", 1, 1).is_parameter_eligible());
        assert!(Token::new(TokenKind::Regex, "\\.php$", 1, 1).is_parameter_eligible());

        assert!(!Token::new(TokenKind::Semicolon, ";", 1, 1).is_parameter_eligible());
        assert!(!Token::new(TokenKind::BlockStart, "{", 1, 1).is_parameter_eligible());
        assert!(!Token::new(TokenKind::Comment, "# note", 1, 1).is_parameter_eligible());
        assert!(!Token::new(TokenKind::Eof, "", 1, 1).is_parameter_eligible());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::BlockStart.to_string(), "'{'");
        assert_eq!(TokenKind::Semicolon.to_string(), "';'");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
