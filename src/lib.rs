//! # ngx-config
//!
//! Parse nginx configurations into an inspectable tree and answer `location`
//! queries against it.
//!
//! Two operations are primary:
//!
//! 1. **Parse**: turn configuration text (or a file and everything it
//!    `include`s) into a serializable [`Payload`](ast::Payload), with every
//!    directive validated against the catalog of known nginx directives.
//! 2. **Match**: given a request path, select the `location` block nginx
//!    itself would choose.
//!
//! ## Quick Start
//!
//! ```
//! use ngx_config::{parse_string, ParseOptions};
//!
//! let payload = parse_string("events { worker_connections 1024; }", &ParseOptions::default());
//!
//! let events = &payload.config[0].parsed[0];
//! assert_eq!(events.name, "events");
//! assert_eq!(events.block.as_ref().unwrap()[0].args, vec!["1024"]);
//! ```
//!
//! ## Location matching
//!
//! ```
//! use ngx_config::{match_location, parse_string, ParseOptions};
//!
//! let conf = r"
//!     http {
//!         server {
//!             location / { return 200; }
//!             location = /health { return 204; }
//!         }
//!     }
//! ";
//!
//! let payload = parse_string(conf, &ParseOptions::default());
//! let matched = match_location(&payload, "/health").unwrap();
//! assert_eq!(matched.modifier, "=");
//! assert_eq!(matched.path, "/health");
//! ```
//!
//! ## Parsing files with includes
//!
//! ```no_run
//! use ngx_config::{parse_file, ParseOptions};
//!
//! let payload = parse_file("/etc/nginx/nginx.conf", &ParseOptions::default());
//! for config in &payload.config {
//!     println!("{}: {} top-level directives", config.file, config.parsed.len());
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli`: the `ngx-config` command-line tool (binary only)
//! - `wasm`: wasm-bindgen exports for embedding in a JavaScript host

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Public modules
pub mod analyzer;
pub mod ast;
pub mod error;
pub mod matcher;
pub mod parser;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use error::{Error, ParseError, Result};
pub use matcher::{match_location, LocationMatch};
pub use parser::{parse_file, parse_string, ParseOptions};

/// Commonly used imports for quick setup
///
/// ```rust
/// use ngx_config::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ast::{Config, Directive, Payload, Status};
    pub use crate::error::{Error, ParseError, Result};
    pub use crate::matcher::{match_location, LocationMatch};
    pub use crate::parser::{parse_file, parse_string, Lexer, ParseOptions, Token, TokenKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let payload = parse_string(
            "user nginx;\nworker_processes auto;\n",
            &ParseOptions::default(),
        );

        assert_eq!(payload.config.len(), 1);
        let parsed = &payload.config[0].parsed;
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "user");
        assert_eq!(parsed[1].name, "worker_processes");
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let payload = parse_string("user nginx;", &ParseOptions::default());
        assert_eq!(payload.status, Status::Ok);
    }

    #[test]
    fn test_payload_serializes() {
        let payload = parse_string("user nginx;", &ParseOptions::default());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["config"][0]["parsed"][0]["directive"], "user");
    }
}
