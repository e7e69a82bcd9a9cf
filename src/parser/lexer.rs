//! Lexer for nginx configuration files

use crate::error::ParseError;
use crate::parser::{Token, TokenKind};

/// Streaming lexer for nginx configuration syntax
///
/// Tokens are produced one at a time through [`next_token`](Self::next_token);
/// the parser consumes them through a two-token window and never retains them.
pub struct Lexer<'a> {
    /// The input source text
    input: &'a str,
    /// Current position in bytes
    pos: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    col: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan and return the next token
    ///
    /// # Errors
    ///
    /// Returns an error if a quoted string is left unterminated at end of
    /// input. This is the only fatal condition at the lexical level.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace();

        let line = self.line;
        let col = self.col;

        if self.is_eof() {
            return Ok(Token::new(TokenKind::Eof, "", line, col));
        }

        let ch = self.current_char();
        let token = match ch {
            ';' => {
                self.advance();
                Token::new(TokenKind::Semicolon, ";", line, col)
            }
            '{' => {
                self.advance();
                Token::new(TokenKind::BlockStart, "{", line, col)
            }
            '}' => {
                self.advance();
                Token::new(TokenKind::BlockEnd, "}", line, col)
            }
            '#' => Token::new(TokenKind::Comment, self.scan_comment(), line, col),
            '$' => Token::new(TokenKind::Variable, self.scan_word(), line, col),
            '"' | '\'' | '`' => {
                Token::new(TokenKind::QuotedString, self.scan_quoted_string(ch)?, line, col)
            }
            _ => Token::new(TokenKind::Keyword, self.scan_word(), line, col),
        };

        Ok(token)
    }

    /// Skip whitespace characters, tracking line/column
    fn skip_whitespace(&mut self) {
        while !self.is_eof() {
            match self.current_char() {
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.col = 1;
                }
                ' ' | '\t' | '\r' => self.advance(),
                _ => break,
            }
        }
    }

    /// Scan a comment up to (not including) the end of line
    ///
    /// The literal keeps the leading `#`.
    fn scan_comment(&mut self) -> String {
        let start = self.pos;
        while !self.is_eof() && !is_end_of_line(self.current_char()) {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    /// Scan a keyword or variable: the first character unconditionally, then
    /// everything up to a keyword terminator
    ///
    /// Variables keep their `$` prefix in the literal.
    fn scan_word(&mut self) -> String {
        let start = self.pos;
        self.advance();
        while !self.is_eof() && !is_keyword_terminator(self.current_char()) {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    /// Scan a quoted string using `delimiter` as the closing character
    ///
    /// A backslash before `\`, `n`, `r`, `t` or the delimiter is decoded to
    /// the escaped character; any other backslash is kept literally. The
    /// returned literal keeps the surrounding delimiters around the decoded
    /// body.
    fn scan_quoted_string(&mut self, delimiter: char) -> Result<String, ParseError> {
        let mut literal = String::new();
        literal.push(self.current_char());
        self.advance();

        loop {
            if self.is_eof() {
                return Err(ParseError::new(
                    "unexpected end of file while scanning a string, maybe an unclosed quote?",
                    None,
                    Some(self.line),
                ));
            }

            let ch = self.current_char();

            if ch == '\\' {
                if let Some(escaped) = self.peek_char().and_then(|next| decode_escape(next, delimiter)) {
                    self.advance();
                    self.advance();
                    literal.push(escaped);
                    continue;
                }
            }

            self.advance();
            literal.push(ch);

            if ch == delimiter {
                break;
            }
        }

        Ok(literal)
    }

    /// Get the character at the current position
    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    /// Look at the character after the current one
    fn peek_char(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Check if at end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Advance past the current character
    fn advance(&mut self) {
        if !self.is_eof() {
            let ch = self.current_char();
            self.pos += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }
}

/// Check for `\r` or `\n`
fn is_end_of_line(ch: char) -> bool {
    ch == '\r' || ch == '\n'
}

/// Characters that end a keyword or variable token
fn is_keyword_terminator(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '{' | ';')
}

/// Decode a backslash escape, if `ch` is escapable with this delimiter
fn decode_escape(ch: char, delimiter: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '\\' => Some('\\'),
        _ if ch == delimiter => Some(delimiter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_lex_simple_directive() {
        let tokens = lex_all("user nginx;");

        assert_eq!(tokens.len(), 4); // user, nginx, ;, EOF
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[0].literal, "user");
        assert_eq!(tokens[1].literal, "nginx");
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_lex_block() {
        let tokens = lex_all("server { listen 80; }");

        assert_eq!(tokens[0].literal, "server");
        assert_eq!(tokens[1].kind, TokenKind::BlockStart);
        assert_eq!(tokens[2].literal, "listen");
        assert_eq!(tokens[3].literal, "80");
        assert_eq!(tokens[4].kind, TokenKind::Semicolon);
        assert_eq!(tokens[5].kind, TokenKind::BlockEnd);
    }

    #[test]
    fn test_lex_keyword_stops_at_brace() {
        // no whitespace before the brace
        let tokens = lex_all("events{}");
        assert_eq!(tokens[0].literal, "events");
        assert_eq!(tokens[1].kind, TokenKind::BlockStart);
        assert_eq!(tokens[2].kind, TokenKind::BlockEnd);
    }

    #[test]
    fn test_lex_quoted_string_keeps_delimiters() {
        let tokens = lex_all(r#"root "/var/www";"#);

        assert_eq!(tokens[0].literal, "root");
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].literal, "\"/var/www\"");
    }

    #[test]
    fn test_lex_quoted_string_escapes() {
        let tokens = lex_all(r#"log_format main "a\tb\"c\\d";"#);
        assert_eq!(tokens[2].kind, TokenKind::QuotedString);
        assert_eq!(tokens[2].literal, "\"a\tb\"c\\d\"");
    }

    #[test]
    fn test_lex_unknown_escape_is_literal() {
        let tokens = lex_all(r#""a\.b";"#);
        assert_eq!(tokens[0].literal, "\"a\\.b\"");
    }

    #[test]
    fn test_lex_single_quotes_and_backticks() {
        let tokens = lex_all("set $a 'x y'; set $b `z`;");
        assert_eq!(tokens[2].kind, TokenKind::QuotedString);
        assert_eq!(tokens[2].literal, "'x y'");
        assert_eq!(tokens[6].literal, "`z`");
    }

    #[test]
    fn test_lex_variable_keeps_dollar() {
        let tokens = lex_all("set $host localhost;");

        assert_eq!(tokens[0].literal, "set");
        assert_eq!(tokens[1].kind, TokenKind::Variable);
        assert_eq!(tokens[1].literal, "$host");
        assert_eq!(tokens[2].literal, "localhost");
    }

    #[test]
    fn test_lex_comment_keeps_hash() {
        let tokens = lex_all("# main config\nuser nginx;");

        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].literal, "# main config");
        assert_eq!(tokens[1].literal, "user");
    }

    #[test]
    fn test_position_tracking() {
        let tokens = lex_all("server\n{\n  listen 80;\n}");

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));
        assert_eq!((tokens[2].line, tokens[2].column), (3, 3));
        assert_eq!((tokens[3].line, tokens[3].column), (3, 10));
        assert_eq!(tokens[5].line, 4);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("root \"/var/www\nserver {}");
        assert_eq!(lexer.next_token().unwrap().literal, "root");

        let err = loop {
            match lexer.next_token() {
                Ok(_) => continue,
                Err(err) => break err,
            }
        };
        assert!(err.what.contains("unclosed quote"));
    }

    #[test]
    fn test_regex_path_lexes_as_keyword() {
        let tokens = lex_all(r"location ~ \.php$ { }");
        assert_eq!(tokens[1].literal, "~");
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].literal, r"\.php$");
    }
}
