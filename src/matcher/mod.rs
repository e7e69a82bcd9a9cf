//! nginx `location` selection against a parsed payload
//!
//! Reproduces the order nginx itself uses to pick a `location` for a request
//! path: exact matches first, then the longest `""`/`^~` prefix (a `^~`
//! winner short-circuits), then regexes in source order, then the prefix
//! winner as fallback.

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::ast::{Directive, Payload};
use crate::error::{Error, Result};

/// Exact-match modifier: `location = /path`
pub const EXACT: &str = "=";
/// Case-sensitive regex modifier: `location ~ pattern`
pub const REGEX: &str = "~";
/// Case-insensitive regex modifier: `location ~* pattern`
pub const REGEX_NO_CASE: &str = "~*";
/// Prefix modifier that suppresses the regex pass: `location ^~ /path`
pub const PREFIX_PRIORITY: &str = "^~";
/// The empty modifier of a plain prefix location
pub const PREFIX: &str = "";

/// The `location` block selected for a target path
///
/// Owns its data: `modifier` and `path` are copied out of the AST and the
/// matched block's directives are cloned, so the match outlives the payload
/// it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMatch {
    /// The winning location's modifier (`""` for a plain prefix)
    pub modifier: String,
    /// The winning location's path or pattern, as written
    pub path: String,
    /// The directives inside the matched block
    pub directives: Vec<Directive>,
}

/// A `location` directive normalized for matching
struct Location<'a> {
    modifier: &'a str,
    path: &'a str,
    directive: &'a Directive,
}

impl<'a> Location<'a> {
    /// Normalize a raw `location` directive
    ///
    /// One argument is a plain prefix; two arguments are modifier + path. Any
    /// other arity already failed analysis and takes no part in matching.
    fn from_directive(directive: &'a Directive) -> Option<Self> {
        match directive.args.as_slice() {
            [path] => Some(Self {
                modifier: PREFIX,
                path,
                directive,
            }),
            [modifier, path] => Some(Self {
                modifier,
                path,
                directive,
            }),
            _ => None,
        }
    }

    fn to_match(&self) -> LocationMatch {
        LocationMatch {
            modifier: self.modifier.to_string(),
            path: self.path.to_string(),
            directives: self.directive.block.clone().unwrap_or_default(),
        }
    }
}

/// Select the `location` nginx would use for `target`
///
/// The target may be a full URL (only its path component is matched) or a
/// bare path.
///
/// # Errors
///
/// [`Error::NoLocations`] if the payload holds no `location` directives,
/// [`Error::NoMatch`] if none matches, [`Error::Regex`] if a `~`/`~*`
/// pattern fails to compile.
pub fn match_location(payload: &Payload, target: &str) -> Result<LocationMatch> {
    let path = target_path(target);

    let found = collect_locations(payload);
    if found.is_empty() {
        return Err(Error::NoLocations);
    }

    let locations: Vec<Location<'_>> = found
        .into_iter()
        .filter_map(Location::from_directive)
        .collect();

    select(&locations, &path)
}

/// Reduce the target to the path nginx matches against
fn target_path(target: &str) -> String {
    match Url::parse(target) {
        Ok(url) => url.path().to_string(),
        Err(_) => target.to_string(),
    }
}

/// Collect every `location` directive reachable from the entry config
///
/// Depth-first pre-order, descending into every block and following include
/// references; each referenced config is visited at most once, so every
/// occurrence in the AST is collected exactly once.
fn collect_locations(payload: &Payload) -> Vec<&Directive> {
    let mut found = Vec::new();
    let mut visited = vec![false; payload.config.len()];
    payload.visit_config(0, &mut visited, &mut |directive| {
        if directive.name == "location" {
            found.push(directive);
        }
    });
    found
}

/// Apply nginx's selection order
fn select<'a>(locations: &[Location<'a>], path: &str) -> Result<LocationMatch> {
    // exact matches win outright
    for location in locations {
        if location.modifier == EXACT && location.path == path {
            return Ok(location.to_match());
        }
    }

    // longest prefix among plain and priority prefixes; first one wins ties
    let mut best: Option<&Location<'a>> = None;
    let mut best_len = 0;
    for location in locations {
        if location.modifier != PREFIX && location.modifier != PREFIX_PRIORITY {
            continue;
        }
        if path.starts_with(location.path) && location.path.len() > best_len {
            best_len = location.path.len();
            best = Some(location);
        }
    }

    // a ^~ winner suppresses the regex pass
    if let Some(best) = best {
        if best.modifier == PREFIX_PRIORITY {
            return Ok(best.to_match());
        }
    }

    // regexes in source order
    for location in locations {
        if location.modifier != REGEX && location.modifier != REGEX_NO_CASE {
            continue;
        }
        let pattern = if location.modifier == REGEX_NO_CASE {
            format!("(?i){}", location.path)
        } else {
            location.path.to_string()
        };
        let re = Regex::new(&pattern)?;
        if re.find(path).map_or(false, |m| !m.as_str().is_empty()) {
            return Ok(location.to_match());
        }
    }

    // fall back to the longest prefix
    if let Some(best) = best {
        return Ok(best.to_match());
    }

    Err(Error::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_string, ParseOptions};

    fn payload(input: &str) -> Payload {
        parse_string(input, &ParseOptions::default())
    }

    fn server(locations: &str) -> String {
        format!("http {{ server {{ {locations} }} }}")
    }

    #[test]
    fn test_exact_match_wins() {
        let payload = payload(&server(
            "location / { return 200; }\n\
             location = /foo { return 201; }\n\
             location ~ ^/foo$ { return 202; }",
        ));

        let matched = match_location(&payload, "/foo").unwrap();
        assert_eq!(matched.modifier, "=");
        assert_eq!(matched.path, "/foo");
        assert_eq!(matched.directives[0].name, "return");
        assert_eq!(matched.directives[0].args, vec!["201"]);
    }

    #[test]
    fn test_prefix_priority_skips_regex() {
        let payload = payload(&server(
            "location ^~ /static/ { return 1; }\n\
             location ~ \\.png$ { return 2; }",
        ));

        let matched = match_location(&payload, "/static/logo.png").unwrap();
        assert_eq!(matched.modifier, "^~");
        assert_eq!(matched.path, "/static/");
    }

    #[test]
    fn test_regex_beats_prefix_fallback() {
        let payload = payload(&server(
            "location / { return 1; }\n\
             location ~ \\.php$ { return 2; }",
        ));

        let matched = match_location(&payload, "/a/b.php").unwrap();
        assert_eq!(matched.modifier, "~");
        assert_eq!(matched.path, "\\.php$");

        let matched = match_location(&payload, "/a/b.html").unwrap();
        assert_eq!(matched.modifier, "");
        assert_eq!(matched.path, "/");
    }

    #[test]
    fn test_case_insensitive_regex() {
        let insensitive = payload(&server("location ~* \\.jpg$ { return 1; }"));
        let matched = match_location(&insensitive, "/photo.JPG").unwrap();
        assert_eq!(matched.modifier, "~*");

        let sensitive = payload(&server("location ~ \\.jpg$ { return 1; }"));
        assert!(matches!(
            match_location(&sensitive, "/photo.JPG"),
            Err(Error::NoMatch)
        ));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let payload = payload(&server(
            "location / { return 1; }\n\
             location /images/ { return 2; }",
        ));

        let matched = match_location(&payload, "/images/cat.gif").unwrap();
        assert_eq!(matched.path, "/images/");
    }

    #[test]
    fn test_first_prefix_wins_ties() {
        let payload = payload(&server(
            "location /a { return 1; }\n\
             location /a { return 2; }",
        ));

        let matched = match_location(&payload, "/a/b").unwrap();
        assert_eq!(matched.directives[0].args, vec!["1"]);
    }

    #[test]
    fn test_url_target_uses_path_component() {
        let payload = payload(&server("location = /foo { return 1; }"));

        let matched = match_location(&payload, "https://example.com/foo?x=1").unwrap();
        assert_eq!(matched.path, "/foo");
    }

    #[test]
    fn test_no_locations() {
        let payload = payload("events { worker_connections 1024; }");
        assert!(matches!(
            match_location(&payload, "/foo"),
            Err(Error::NoLocations)
        ));
    }

    #[test]
    fn test_no_match() {
        let payload = payload(&server("location = /only { return 1; }"));
        assert!(matches!(match_location(&payload, "/other"), Err(Error::NoMatch)));
    }

    #[test]
    fn test_bad_regex_is_an_error() {
        let payload = payload(&server("location ~ ( { return 1; }"));
        assert!(matches!(
            match_location(&payload, "/anything"),
            Err(Error::Regex(_))
        ));
    }

    #[test]
    fn test_locations_collected_from_every_block() {
        // locations nested under different enclosing blocks are all found
        let payload = payload(
            "http {\n\
               server { location /a { return 1; } }\n\
               server { location /a/b { return 2; } }\n\
             }",
        );

        let matched = match_location(&payload, "/a/b/c").unwrap();
        assert_eq!(matched.path, "/a/b");
    }

    #[test]
    fn test_three_arg_location_is_skipped() {
        let payload = payload(&server(
            "location = /foo bar { return 1; }\n\
             location /foo { return 2; }",
        ));

        let matched = match_location(&payload, "/foo").unwrap();
        assert_eq!(matched.directives[0].args, vec!["2"]);
    }
}
