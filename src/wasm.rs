//! WebAssembly bindings
//!
//! Exposes the parser and the location matcher to a JavaScript host. Both
//! entry points take configuration text (string input only: the browser has
//! no filesystem to expand includes from) and return indented JSON; failures
//! surface as thrown `Error`s, which become promise rejections under an async
//! wrapper.

use wasm_bindgen::prelude::*;

use crate::matcher;
use crate::parser::{parse_string, ParseOptions};

/// Initialize the module (installs a panic hook for readable errors)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Parse configuration text and return the payload as indented JSON
///
/// `skip_ctx` disables the directive-context check, for fragments pasted
/// without their enclosing blocks.
///
/// # Errors
///
/// Throws a JS error carrying the first recorded parse error's rendering, or
/// a serialization failure.
#[wasm_bindgen]
pub fn parse_config(conf: &str, skip_ctx: bool) -> Result<String, JsValue> {
    parse_config_impl(conf, skip_ctx).map_err(|message| JsValue::from_str(&message))
}

/// Parse configuration text, then select the `location` for `target`
///
/// Returns the match (modifier, path, and the directives inside the matched
/// block) as indented JSON.
///
/// # Errors
///
/// Throws a JS error for parse failures, matcher outcomes (`no location(s)
/// found`, `no match found`, regex compilation), or serialization failures.
#[wasm_bindgen]
pub fn test_location(conf: &str, target: &str, skip_ctx: bool) -> Result<String, JsValue> {
    test_location_impl(conf, target, skip_ctx).map_err(|message| JsValue::from_str(&message))
}

/// Get the crate version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_config_impl(conf: &str, skip_ctx: bool) -> Result<String, String> {
    let payload = parse_string(conf, &bridge_options(skip_ctx));
    if let Some(err) = payload.first_error() {
        return Err(err.to_string());
    }
    serde_json::to_string_pretty(&payload).map_err(|err| err.to_string())
}

fn test_location_impl(conf: &str, target: &str, skip_ctx: bool) -> Result<String, String> {
    let payload = parse_string(conf, &bridge_options(skip_ctx));
    if let Some(err) = payload.first_error() {
        return Err(err.to_string());
    }

    let matched = matcher::match_location(&payload, target).map_err(|err| err.to_string())?;
    serde_json::to_string_pretty(&matched).map_err(|err| err.to_string())
}

/// Options for string input from a host: one file, halt on the first error
fn bridge_options(skip_ctx: bool) -> ParseOptions {
    ParseOptions {
        single_file: true,
        stop_parsing_on_error: true,
        skip_directive_context_check: skip_ctx,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_returns_json() {
        let json = parse_config_impl("events { worker_connections 1024; }", false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["config"][0]["parsed"][0]["directive"], "events");
    }

    #[test]
    fn test_parse_config_rejects_on_error() {
        // worker_connections outside events is a context violation
        let err = parse_config_impl("worker_connections 1024;", false).unwrap_err();
        assert_eq!(err, "\"worker_connections\" directive is not allowed here in 1");
    }

    #[test]
    fn test_skip_ctx_allows_fragments() {
        assert!(parse_config_impl("worker_connections 1024;", true).is_ok());
    }

    #[test]
    fn test_test_location_matches() {
        let conf = "http { server { location = /foo { return 200; } } }";
        let json = test_location_impl(conf, "/foo", false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["modifier"], "=");
        assert_eq!(value["path"], "/foo");
    }

    #[test]
    fn test_test_location_rejects_without_locations() {
        let err = test_location_impl("events { }", "/foo", false).unwrap_err();
        assert_eq!(err, "no location(s) found");
    }
}
