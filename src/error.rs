//! Error types for parsing and location matching

use std::fmt;

/// Result type alias for ngx-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the crate's fallible operations
///
/// Parse results never surface through this type: the parser records every
/// failure inside the returned [`Payload`](crate::ast::Payload). This enum
/// covers the location matcher and the serialization/I-O paths around it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parse-level error escalated by a caller (e.g. the wasm bridge)
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `location` regex failed to compile
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The payload contains no `location` directives at all
    #[error("no location(s) found")]
    NoLocations,

    /// No `location` matched the target path
    #[error("no match found")]
    NoMatch,
}

/// An error recorded while parsing a configuration file
///
/// These are data, not control flow: they accumulate in the owning
/// [`Config`](crate::ast::Config) (or, for an unreadable entry file, in the
/// [`Payload`](crate::ast::Payload)) and serialize alongside the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    /// What went wrong
    pub what: String,
    /// File the error occurred in, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-indexed line of the offending statement, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ParseError {
    /// Create a new parse error
    #[must_use]
    pub fn new(what: impl Into<String>, file: Option<String>, line: Option<usize>) -> Self {
        Self {
            what: what.into(),
            file,
            line,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{} in {}:{}", self.what, file, line),
            (None, Some(line)) => write!(f, "{} in {}", self.what, line),
            _ => write!(f, "{}", self.what),
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_with_file_and_line() {
        let err = ParseError::new(
            r#"unknown directive "frobnicate""#,
            Some("/etc/nginx/nginx.conf".to_string()),
            Some(12),
        );
        assert_eq!(
            err.to_string(),
            r#"unknown directive "frobnicate" in /etc/nginx/nginx.conf:12"#
        );
    }

    #[test]
    fn test_parse_error_with_line_only() {
        let err = ParseError::new("unexpected \"}\"", None, Some(3));
        assert_eq!(err.to_string(), "unexpected \"}\" in 3");
    }

    #[test]
    fn test_parse_error_bare() {
        let err = ParseError::new("premature end of file", None, None);
        assert_eq!(err.to_string(), "premature end of file");
    }

    #[test]
    fn test_matcher_errors_render() {
        assert_eq!(Error::NoLocations.to_string(), "no location(s) found");
        assert_eq!(Error::NoMatch.to_string(), "no match found");
    }

    #[test]
    fn test_parse_error_into_error() {
        let err: Error = ParseError::new("bad context", None, Some(1)).into();
        assert_eq!(err.to_string(), "bad context in 1");
    }
}
