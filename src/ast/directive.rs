//! Directive AST nodes

use serde::{Deserialize, Serialize};

/// A single directive in an nginx configuration
///
/// A directive either terminated with `;` (`block` is `None`) or opened a
/// `{ … }` body (`block` holds the children, possibly empty). Comments are
/// preserved as pseudo-directives whose name is `"#"` and whose text lives in
/// `comment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// The directive name (`"#"` for a preserved comment)
    #[serde(rename = "directive")]
    pub name: String,
    /// Line of the directive's first token (1-indexed)
    pub line: usize,
    /// Arguments in source order, in their lexical form (quoted strings keep
    /// their delimiters, variables their `$`)
    #[serde(default)]
    pub args: Vec<String>,
    /// Originating file, stamped onto directives of a combined payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// For `include` directives: indices into the payload's `config` list
    /// identifying the files this include resolved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<usize>>,
    /// Child directives, present iff the directive opened a block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Vec<Directive>>,
    /// Comment text (without the leading `#`) for `"#"` pseudo-directives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Directive {
    /// Create a new directive with no arguments or block
    #[must_use]
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            args: Vec::new(),
            file: None,
            includes: None,
            block: None,
            comment: None,
        }
    }

    /// Create a comment pseudo-directive
    #[must_use]
    pub fn comment(text: impl Into<String>, line: usize) -> Self {
        let mut directive = Self::new("#", line);
        directive.comment = Some(text.into());
        directive
    }

    /// Check if this directive opened a block
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.block.is_some()
    }

    /// Check if this is a preserved comment
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.name == "#"
    }

    /// Check if this is an `include` directive
    #[must_use]
    pub fn is_include(&self) -> bool {
        self.name == "include"
    }

    /// Get the first argument, if any
    #[must_use]
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Find direct children with a given name
    #[must_use]
    pub fn find_children(&self, name: &str) -> Vec<&Directive> {
        self.block
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|d| d.name == name)
            .collect()
    }

    /// Recursively find all directives with a given name, this one included
    ///
    /// Include references are not followed here; use
    /// [`Payload::find_directives`](crate::ast::Payload::find_directives) to
    /// search across files.
    #[must_use]
    pub fn find_recursive(&self, name: &str) -> Vec<&Directive> {
        let mut result = Vec::new();
        self.find_recursive_impl(name, &mut result);
        result
    }

    fn find_recursive_impl<'a>(&'a self, name: &str, result: &mut Vec<&'a Directive>) {
        if self.name == name {
            result.push(self);
        }
        if let Some(children) = &self.block {
            for child in children {
                child.find_recursive_impl(name, result);
            }
        }
    }
}
