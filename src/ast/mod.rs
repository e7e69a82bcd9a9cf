//! Abstract syntax tree for parsed nginx configurations
//!
//! A parse produces one [`Payload`] owning one [`Config`] per file touched:
//! the entry file first, then every file discovered through `include`
//! expansion in the order it was first opened. `include` directives refer to
//! other configs by index into [`Payload::config`], so the include graph is
//! cycle-safe and serializes flat.

mod directive;

pub use directive::Directive;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Outcome of parsing a file or a whole payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Parsed without recorded errors
    Ok,
    /// One or more errors were recorded
    Failed,
}

/// The parse result for a single configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Canonical absolute path of the file (empty for string input)
    pub file: String,
    /// Whether this file parsed cleanly
    pub status: Status,
    /// Errors recorded while parsing this file
    pub errors: Vec<ParseError>,
    /// Top-level directives in source order
    pub parsed: Vec<Directive>,
}

impl Config {
    /// Create an empty config for a file
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: Status::Ok,
            errors: Vec::new(),
            parsed: Vec::new(),
        }
    }
}

/// The complete parse result for an entry file and its transitive includes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Overall status; `Failed` iff a payload-level error was recorded
    pub status: Status,
    /// Payload-level errors (the entry file could not be opened)
    pub errors: Vec<ParseError>,
    /// Parsed files: entry first, then includes in first-open order
    pub config: Vec<Config>,
}

impl Payload {
    /// Create an empty, successful payload
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: Status::Ok,
            errors: Vec::new(),
            config: Vec::new(),
        }
    }

    /// Create a failed payload for an entry file that could not be opened
    #[must_use]
    pub fn open_failure(file: impl Into<String>, err: &std::io::Error) -> Self {
        Self {
            status: Status::Failed,
            errors: vec![ParseError::new(err.to_string(), Some(file.into()), None)],
            config: Vec::new(),
        }
    }

    /// The first recorded error, payload-level before file-level
    #[must_use]
    pub fn first_error(&self) -> Option<&ParseError> {
        self.errors
            .first()
            .or_else(|| self.config.iter().find_map(|c| c.errors.first()))
    }

    /// Whether at least one config parsed without errors
    #[must_use]
    pub fn has_successful_config(&self) -> bool {
        self.config.iter().any(|c| c.status == Status::Ok)
    }

    /// Find every directive with the given name across all files
    ///
    /// Traversal starts at the entry config, descends into every block, and
    /// follows `include` references; each referenced config is visited at
    /// most once. Comments are never returned.
    #[must_use]
    pub fn find_directives(&self, name: &str) -> Vec<&Directive> {
        let mut found = Vec::new();
        let mut visited = vec![false; self.config.len()];
        self.visit_config(0, &mut visited, &mut |directive| {
            if directive.name == name {
                found.push(directive);
            }
        });
        found
    }

    /// Walk every directive reachable from the entry config in depth-first
    /// pre-order, following include references
    pub(crate) fn visit_config<'a, F>(&'a self, index: usize, visited: &mut Vec<bool>, visit: &mut F)
    where
        F: FnMut(&'a Directive),
    {
        if index >= self.config.len() || visited[index] {
            return;
        }
        visited[index] = true;
        self.visit_directives(&self.config[index].parsed, visited, visit);
    }

    fn visit_directives<'a, F>(&'a self, directives: &'a [Directive], visited: &mut Vec<bool>, visit: &mut F)
    where
        F: FnMut(&'a Directive),
    {
        for directive in directives {
            visit(directive);
            if let Some(includes) = &directive.includes {
                for &index in includes {
                    self.visit_config(index, visited, visit);
                }
            }
            if let Some(block) = &directive.block {
                self.visit_directives(block, visited, visit);
            }
        }
    }

    /// Flatten the payload into a single config
    ///
    /// The combined config carries the entry file's name; its `parsed` stream
    /// is the entry stream with every `include` occurrence replaced in place
    /// by the parsed contents of the files it resolved to. Directives are
    /// stamped with their originating file. Errors and failure status from
    /// all files are merged into the one config.
    #[must_use]
    pub fn combined(&self) -> Payload {
        let mut combined = Config::new(self.config.first().map(|c| c.file.clone()).unwrap_or_default());

        for config in &self.config {
            combined.errors.extend(config.errors.iter().cloned());
            if config.status == Status::Failed {
                combined.status = Status::Failed;
            }
        }

        if !self.config.is_empty() {
            let mut visited = vec![false; self.config.len()];
            combined.parsed = self.expand_config(0, &mut visited);
        }

        Payload {
            status: self.status,
            errors: self.errors.clone(),
            config: vec![combined],
        }
    }

    fn expand_config(&self, index: usize, visited: &mut Vec<bool>) -> Vec<Directive> {
        if index >= self.config.len() || visited[index] {
            return Vec::new();
        }
        visited[index] = true;
        let config = &self.config[index];
        self.expand_directives(&config.parsed, &config.file, visited)
    }

    fn expand_directives(
        &self,
        directives: &[Directive],
        file: &str,
        visited: &mut Vec<bool>,
    ) -> Vec<Directive> {
        let mut expanded = Vec::new();
        for directive in directives {
            if let Some(includes) = &directive.includes {
                for &index in includes {
                    expanded.extend(self.expand_config(index, visited));
                }
                continue;
            }
            let mut directive = directive.clone();
            if !file.is_empty() {
                directive.file = Some(file.to_string());
            }
            if let Some(block) = directive.block.take() {
                directive.block = Some(self.expand_directives(&block, file, visited));
            }
            expanded.push(directive);
        }
        expanded
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}
