//! Directive validation against the static catalog
//!
//! Every completed statement is checked here: is the directive known, is it
//! allowed in the block context it appears in, does its terminator match the
//! registration, and does its argument count fit one of the registered
//! shapes. Violations are returned as [`ParseError`] data and recorded by the
//! parser; nothing here aborts a parse on its own.

pub mod catalog;

use crate::ast::Directive;
use crate::error::ParseError;
use crate::parser::ParseOptions;

/// How a statement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `;`
    Semicolon,
    /// `{`
    BlockStart,
}

/// Map a block context to its context bit
///
/// Returns `None` for contexts the catalog has no registration for (an
/// unrecognized block shape); such statements are passed through unchecked.
#[must_use]
pub fn context_mask(ctx: &[String]) -> Option<u32> {
    let parts: Vec<&str> = ctx.iter().map(String::as_str).collect();
    match parts.as_slice() {
        [] => Some(catalog::MAIN_CONF),
        ["events"] => Some(catalog::EVENT_CONF),
        ["mail"] => Some(catalog::MAIL_MAIN_CONF),
        ["mail", "server"] => Some(catalog::MAIL_SRV_CONF),
        ["stream"] => Some(catalog::STREAM_MAIN_CONF),
        ["stream", "server"] => Some(catalog::STREAM_SRV_CONF),
        ["stream", "upstream"] => Some(catalog::STREAM_UPS_CONF),
        ["http"] => Some(catalog::HTTP_MAIN_CONF),
        ["http", "server"] => Some(catalog::HTTP_SRV_CONF),
        ["http", "location"] => Some(catalog::HTTP_LOC_CONF),
        ["http", "upstream"] => Some(catalog::HTTP_UPS_CONF),
        ["http", "server", "if"] => Some(catalog::HTTP_SIF_CONF),
        ["http", "location", "if"] => Some(catalog::HTTP_LIF_CONF),
        ["http", "location", "limit_except"] => Some(catalog::HTTP_LMT_CONF),
        _ => None,
    }
}

/// Compute the context entered by a block-opening statement
///
/// A `location` opened anywhere under `http` yields `["http", "location"]`:
/// the HTTP-location bit means "location block in http", so nested locations
/// keep their textual nesting in the AST but validate identically.
#[must_use]
pub fn enter_block_ctx(ctx: &[String], name: &str) -> Vec<String> {
    if ctx.first().map(String::as_str) == Some("http") && name == "location" {
        return vec!["http".to_string(), "location".to_string()];
    }
    let mut entered = ctx.to_vec();
    entered.push(name.to_string());
    entered
}

/// Validate one completed statement
///
/// # Errors
///
/// Returns the violation as a [`ParseError`] carrying `file` and the
/// statement's line.
pub fn analyze(
    file: Option<&str>,
    stmt: &Directive,
    term: Terminator,
    ctx: &[String],
    options: &ParseOptions,
) -> Result<(), ParseError> {
    let masks = catalog::masks(&stmt.name);

    if masks.is_none() && options.error_on_unknown_directives {
        return Err(stmt_error(
            format!("unknown directive \"{}\"", stmt.name),
            file,
            stmt,
        ));
    }

    // with no registration for the directive or the context there is nothing
    // to check against
    let (Some(masks), Some(curr_ctx)) = (masks, context_mask(ctx)) else {
        return Ok(());
    };

    let ctx_masks: Vec<u32> = if options.skip_directive_context_check {
        masks.to_vec()
    } else {
        let allowed: Vec<u32> = masks.iter().copied().filter(|m| m & curr_ctx != 0).collect();
        if allowed.is_empty() {
            return Err(stmt_error(
                format!("\"{}\" directive is not allowed here", stmt.name),
                file,
                stmt,
            ));
        }
        allowed
    };

    if options.skip_directive_args_check {
        return Ok(());
    }

    let arg_count = stmt.args.len();
    let mut what = String::new();

    for &mask in &ctx_masks {
        if mask & catalog::CONF_BLOCK != 0 && term != Terminator::BlockStart {
            what = format!("directive \"{}\" has no opening \"{{\"", stmt.name);
            continue;
        }
        if mask & catalog::CONF_BLOCK == 0 && term != Terminator::Semicolon {
            what = format!("directive \"{}\" is not terminated by \";\"", stmt.name);
            continue;
        }

        let args_ok = (arg_count <= 7 && (mask >> arg_count) & 1 != 0)
            || (mask & catalog::CONF_FLAG != 0 && arg_count == 1 && valid_flag(&stmt.args[0]))
            || mask & catalog::CONF_ANY != 0
            || (mask & catalog::CONF_1MORE != 0 && arg_count >= 1)
            || (mask & catalog::CONF_2MORE != 0 && arg_count >= 2);

        if args_ok {
            return Ok(());
        }

        if mask & catalog::CONF_FLAG != 0 && arg_count == 1 {
            what = format!(
                "invalid value \"{}\" in \"{}\" directive, it must be \"on\" or \"off\"",
                stmt.args[0], stmt.name
            );
        } else {
            what = format!("invalid number of arguments in \"{}\" directive", stmt.name);
        }
    }

    Err(stmt_error(what, file, stmt))
}

/// Flag directives accept exactly `on` or `off`, case-insensitively
fn valid_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("off")
}

fn stmt_error(what: String, file: Option<&str>, stmt: &Directive) -> ParseError {
    ParseError::new(what, file.map(str::to_string), Some(stmt.line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(name: &str, args: &[&str]) -> Directive {
        let mut directive = Directive::new(name, 1);
        directive.args = args.iter().map(|&a| a.to_string()).collect();
        directive
    }

    fn ctx(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_string()).collect()
    }

    #[test]
    fn test_unknown_directive_passes_by_default() {
        let options = ParseOptions::default();
        let result = analyze(
            None,
            &stmt("frobnicate", &["on"]),
            Terminator::Semicolon,
            &[],
            &options,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unknown_directive_strict() {
        let options = ParseOptions {
            error_on_unknown_directives: true,
            ..Default::default()
        };
        let err = analyze(
            Some("nginx.conf"),
            &stmt("frobnicate", &["on"]),
            Terminator::Semicolon,
            &[],
            &options,
        )
        .unwrap_err();
        assert_eq!(err.what, "unknown directive \"frobnicate\"");
        assert_eq!(err.file.as_deref(), Some("nginx.conf"));
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_wrong_context() {
        let options = ParseOptions::default();
        let err = analyze(
            None,
            &stmt("worker_connections", &["1024"]),
            Terminator::Semicolon,
            &[],
            &options,
        )
        .unwrap_err();
        assert_eq!(err.what, "\"worker_connections\" directive is not allowed here");
    }

    #[test]
    fn test_right_context() {
        let options = ParseOptions::default();
        let result = analyze(
            None,
            &stmt("worker_connections", &["1024"]),
            Terminator::Semicolon,
            &ctx(&["events"]),
            &options,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_skip_context_check() {
        let options = ParseOptions {
            skip_directive_context_check: true,
            ..Default::default()
        };
        let result = analyze(
            None,
            &stmt("worker_connections", &["1024"]),
            Terminator::Semicolon,
            &[],
            &options,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_block() {
        let options = ParseOptions::default();
        let err = analyze(
            None,
            &stmt("events", &[]),
            Terminator::Semicolon,
            &[],
            &options,
        )
        .unwrap_err();
        assert_eq!(err.what, "directive \"events\" has no opening \"{\"");
    }

    #[test]
    fn test_unexpected_block() {
        let options = ParseOptions::default();
        let err = analyze(
            None,
            &stmt("worker_processes", &["auto"]),
            Terminator::BlockStart,
            &[],
            &options,
        )
        .unwrap_err();
        assert_eq!(err.what, "directive \"worker_processes\" is not terminated by \";\"");
    }

    #[test]
    fn test_bad_arg_count() {
        let options = ParseOptions::default();
        let err = analyze(
            None,
            &stmt("worker_connections", &["1024", "2048"]),
            Terminator::Semicolon,
            &ctx(&["events"]),
            &options,
        )
        .unwrap_err();
        assert_eq!(
            err.what,
            "invalid number of arguments in \"worker_connections\" directive"
        );
    }

    #[test]
    fn test_flag_values() {
        let options = ParseOptions::default();
        let http = ctx(&["http"]);

        assert!(analyze(None, &stmt("sendfile", &["on"]), Terminator::Semicolon, &http, &options).is_ok());
        assert!(analyze(None, &stmt("sendfile", &["OFF"]), Terminator::Semicolon, &http, &options).is_ok());

        let err = analyze(
            None,
            &stmt("sendfile", &["yes"]),
            Terminator::Semicolon,
            &http,
            &options,
        )
        .unwrap_err();
        assert_eq!(
            err.what,
            "invalid value \"yes\" in \"sendfile\" directive, it must be \"on\" or \"off\""
        );
    }

    #[test]
    fn test_skip_args_check() {
        let options = ParseOptions {
            skip_directive_args_check: true,
            ..Default::default()
        };
        let result = analyze(
            None,
            &stmt("worker_connections", &["1024", "2048"]),
            Terminator::Semicolon,
            &ctx(&["events"]),
            &options,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_location_argument_shapes() {
        let options = ParseOptions::default();
        let server = ctx(&["http", "server"]);

        assert!(analyze(None, &stmt("location", &["/"]), Terminator::BlockStart, &server, &options).is_ok());
        assert!(analyze(
            None,
            &stmt("location", &["=", "/foo"]),
            Terminator::BlockStart,
            &server,
            &options
        )
        .is_ok());

        let err = analyze(
            None,
            &stmt("location", &["=", "/foo", "/bar"]),
            Terminator::BlockStart,
            &server,
            &options,
        )
        .unwrap_err();
        assert_eq!(err.what, "invalid number of arguments in \"location\" directive");
    }

    #[test]
    fn test_unknown_context_passes() {
        let options = ParseOptions::default();
        let result = analyze(
            None,
            &stmt("listen", &["80"]),
            Terminator::Semicolon,
            &ctx(&["custom_block"]),
            &options,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_enter_block_ctx_flattens_nested_locations() {
        let base = ctx(&["http", "location"]);
        assert_eq!(enter_block_ctx(&base, "location"), ctx(&["http", "location"]));

        let server = ctx(&["http", "server"]);
        assert_eq!(enter_block_ctx(&server, "location"), ctx(&["http", "location"]));
        assert_eq!(enter_block_ctx(&server, "if"), ctx(&["http", "server", "if"]));
        assert_eq!(enter_block_ctx(&[], "stream"), ctx(&["stream"]));
    }

    #[test]
    fn test_context_mask_lookup() {
        assert_eq!(context_mask(&[]), Some(catalog::MAIN_CONF));
        assert_eq!(context_mask(&ctx(&["events"])), Some(catalog::EVENT_CONF));
        assert_eq!(
            context_mask(&ctx(&["http", "location", "limit_except"])),
            Some(catalog::HTTP_LMT_CONF)
        );
        assert_eq!(context_mask(&ctx(&["foo"])), None);
    }
}
