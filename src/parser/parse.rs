//! Parser for nginx configuration files
//!
//! The parser drives the [`Lexer`] through a two-token sliding window
//! (current, lookahead), recursing for nested blocks and expanding `include`
//! directives as it encounters them. Every file touched becomes one
//! [`Config`] in the returned [`Payload`]; a path → index map guards against
//! re-parsing a file reached through multiple (possibly cyclic) includes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::{analyze, enter_block_ctx, Terminator};
use crate::ast::{Config, Directive, Payload, Status};
use crate::error::ParseError;
use crate::parser::{Lexer, Token, TokenKind};

/// Flags controlling a parse invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Parse `include` directives as leaves instead of expanding them
    pub single_file: bool,
    /// Halt the current file at the first recorded error
    pub stop_parsing_on_error: bool,
    /// Do not check directives against their block context
    pub skip_directive_context_check: bool,
    /// Do not check directive argument counts
    pub skip_directive_args_check: bool,
    /// Treat directives missing from the catalog as errors
    pub error_on_unknown_directives: bool,
    /// Flatten the payload into a single combined config after parsing
    pub combine_configs: bool,
}

/// Parse a configuration file and everything it includes
///
/// All failures are recorded in the returned payload: an unopenable entry
/// file yields a failed payload with no configs, anything later lands in the
/// owning config's error list.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Payload {
    let path = path.as_ref();
    let canonical = match fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(err) => return Payload::open_failure(path.display().to_string(), &err),
    };
    let source = match fs::read_to_string(&canonical) {
        Ok(source) => source,
        Err(err) => return Payload::open_failure(canonical.display().to_string(), &err),
    };

    let root_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut parser = Parser::new(*options, root_dir);
    let index = parser.register(canonical);
    parser.parse_source(&source, index, &[]);
    parser.finish()
}

/// Parse configuration text from a string buffer
///
/// String input has no parent directory to resolve includes against and must
/// never touch the filesystem, so `single_file` is forced: `include` stays a
/// leaf directive.
pub fn parse_string(input: &str, options: &ParseOptions) -> Payload {
    let options = ParseOptions {
        single_file: true,
        ..*options
    };
    let mut parser = Parser::new(options, PathBuf::new());
    let index = parser.register(PathBuf::new());
    parser.parse_source(input, index, &[]);
    parser.finish()
}

/// Why parsing of one file stopped early
enum Abort {
    /// A fatal error not yet recorded
    Fatal(ParseError),
    /// `stop_parsing_on_error` tripped; the error is already recorded
    Halted,
}

/// Per-file token window and error sink
struct FileCx<'s> {
    lexer: Lexer<'s>,
    current: Token,
    following: Token,
    /// File name for error attribution, `None` for string input
    file: Option<String>,
    errors: Vec<ParseError>,
}

impl<'s> FileCx<'s> {
    fn new(source: &'s str, file: Option<String>) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let following = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            following,
            file,
            errors: Vec::new(),
        })
    }

    /// Slide the window one token forward
    fn advance(&mut self) -> Result<(), Abort> {
        let next = match self.lexer.next_token() {
            Ok(token) => token,
            Err(err) => return Err(self.fatal_parse_error(err)),
        };
        self.current = std::mem::replace(&mut self.following, next);
        Ok(())
    }

    fn fatal(&self, what: impl Into<String>, line: usize) -> Abort {
        Abort::Fatal(ParseError::new(what, self.file.clone(), Some(line)))
    }

    fn fatal_parse_error(&self, mut err: ParseError) -> Abort {
        err.file = self.file.clone();
        Abort::Fatal(err)
    }
}

/// One parse invocation: owns the growing payload and the include guard
struct Parser {
    options: ParseOptions,
    /// Directory of the entry file; relative includes resolve against it
    root_dir: PathBuf,
    configs: Vec<Config>,
    /// Canonical path → index into `configs`, including in-progress parses
    parsed_includes: HashMap<PathBuf, usize>,
}

impl Parser {
    fn new(options: ParseOptions, root_dir: PathBuf) -> Self {
        Self {
            options,
            root_dir,
            configs: Vec::new(),
            parsed_includes: HashMap::new(),
        }
    }

    /// Reserve a config slot for a file, making it visible to the cycle guard
    /// before its parse begins
    fn register(&mut self, path: PathBuf) -> usize {
        let index = self.configs.len();
        self.configs.push(Config::new(path.display().to_string()));
        self.parsed_includes.insert(path, index);
        index
    }

    fn finish(self) -> Payload {
        let payload = Payload {
            status: Status::Ok,
            errors: Vec::new(),
            config: self.configs,
        };
        if self.options.combine_configs {
            payload.combined()
        } else {
            payload
        }
    }

    /// Read and parse an included file into its reserved slot
    ///
    /// `ctx` is the block context of the `include` statement: an included
    /// file's directives validate as if spliced in at that point.
    fn parse_path(&mut self, path: &Path, index: usize, ctx: &[String]) {
        match fs::read_to_string(path) {
            Ok(source) => self.parse_source(&source, index, ctx),
            Err(err) => {
                let file = self.configs[index].file.clone();
                let config = &mut self.configs[index];
                config.status = Status::Failed;
                config.errors.push(ParseError::new(err.to_string(), Some(file), None));
            }
        }
    }

    /// Parse one file's source into its reserved config slot
    fn parse_source(&mut self, source: &str, index: usize, ctx: &[String]) {
        let file = self.configs[index].file.clone();
        let err_file = if file.is_empty() { None } else { Some(file) };

        let mut parsed = Vec::new();
        let mut errors;

        match FileCx::new(source, err_file.clone()) {
            Ok(mut cx) => {
                if let Err(abort) = self.parse_block(&mut cx, ctx, 0, &mut parsed) {
                    if let Abort::Fatal(err) = abort {
                        cx.errors.push(err);
                    }
                }
                errors = cx.errors;
            }
            Err(mut err) => {
                err.file = err_file;
                errors = Vec::new();
                errors.push(err);
            }
        }

        let config = &mut self.configs[index];
        config.parsed = parsed;
        config.status = if errors.is_empty() { Status::Ok } else { Status::Failed };
        config.errors = errors;
    }

    /// Parse statements until end of block or end of file
    ///
    /// At depth 0 the block ends at EOF and a stray `}` is fatal; at depth > 0
    /// the block ends at `}` (left for the caller to consume) and EOF is
    /// fatal. Completed directives accumulate in `out` so a fatal error keeps
    /// everything parsed before it.
    fn parse_block(
        &mut self,
        cx: &mut FileCx<'_>,
        ctx: &[String],
        depth: usize,
        out: &mut Vec<Directive>,
    ) -> Result<(), Abort> {
        loop {
            match cx.current.kind {
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(cx.fatal("unexpected end of file, expecting \"}\"", cx.current.line));
                    }
                    return Ok(());
                }
                TokenKind::BlockEnd => {
                    if depth == 0 {
                        return Err(cx.fatal("unexpected \"}\"", cx.current.line));
                    }
                    return Ok(());
                }
                TokenKind::Comment => {
                    out.push(Directive::comment(comment_text(&cx.current), cx.current.line));
                    cx.advance()?;
                }
                TokenKind::Keyword => {
                    self.parse_statement(cx, ctx, depth, out)?;
                    cx.advance()?;
                }
                // anything else at statement position is stray; skip it
                _ => cx.advance()?,
            }
        }
    }

    /// Parse one statement starting at the current keyword token
    ///
    /// Returns with the statement's final token (`;` or the block's `}`)
    /// still current.
    fn parse_statement(
        &mut self,
        cx: &mut FileCx<'_>,
        ctx: &[String],
        depth: usize,
        out: &mut Vec<Directive>,
    ) -> Result<(), Abort> {
        let mut stmt = Directive::new(cx.current.literal.clone(), cx.current.line);
        let mut trailing_comments = Vec::new();
        cx.advance()?;

        // arguments, with comments held back for the enclosing block
        loop {
            if cx.current.is_parameter_eligible() {
                stmt.args.push(cx.current.literal.clone());
                cx.advance()?;
            } else if cx.current.kind == TokenKind::Comment {
                trailing_comments.push(Directive::comment(comment_text(&cx.current), cx.current.line));
                cx.advance()?;
            } else {
                break;
            }
        }

        let term = match cx.current.kind {
            TokenKind::Semicolon => Terminator::Semicolon,
            TokenKind::BlockStart => Terminator::BlockStart,
            TokenKind::Eof => {
                return Err(cx.fatal(
                    "unexpected end of file, expecting \";\" or \"{\"",
                    cx.current.line,
                ));
            }
            _ => return Err(cx.fatal("unexpected \"}\"", cx.current.line)),
        };

        if let Err(err) = analyze(cx.file.as_deref(), &stmt, term, ctx, &self.options) {
            cx.errors.push(err);
            if self.options.stop_parsing_on_error {
                return Err(Abort::Halted);
            }
        }

        if term == Terminator::Semicolon {
            if stmt.is_include() && stmt.args.len() == 1 && !self.options.single_file {
                self.expand_include(cx, ctx, &mut stmt)?;
            }
            out.push(stmt);
            out.append(&mut trailing_comments);
            return Ok(());
        }

        // block body
        cx.advance()?;
        let block_ctx = enter_block_ctx(ctx, &stmt.name);
        let mut children = Vec::new();
        let result = self.parse_block(cx, &block_ctx, depth + 1, &mut children);
        stmt.block = Some(children);
        out.push(stmt);
        out.append(&mut trailing_comments);
        result
    }

    /// Expand a completed `include` statement
    ///
    /// The single argument is resolved against the entry directory and
    /// globbed; every match is canonicalized and either recorded as a
    /// reference to an already-registered config or parsed recursively into a
    /// fresh slot. An empty glob result is tolerated (nginx does the same); a
    /// malformed pattern is fatal to the current file.
    fn expand_include(
        &mut self,
        cx: &mut FileCx<'_>,
        ctx: &[String],
        stmt: &mut Directive,
    ) -> Result<(), Abort> {
        let mut pattern = PathBuf::from(&stmt.args[0]);
        if pattern.is_relative() {
            pattern = self.root_dir.join(pattern);
        }

        let matches = match glob::glob(&pattern.to_string_lossy()) {
            Ok(matches) => matches,
            Err(err) => return Err(cx.fatal(err.to_string(), stmt.line)),
        };

        let mut includes = Vec::new();
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    cx.errors.push(ParseError::new(
                        err.to_string(),
                        cx.file.clone(),
                        Some(stmt.line),
                    ));
                    continue;
                }
            };
            let canonical = fs::canonicalize(&path).unwrap_or(path);

            if let Some(&index) = self.parsed_includes.get(&canonical) {
                // already registered, possibly still in progress: reference it
                // and trust the first parse to complete
                includes.push(index);
                continue;
            }

            let index = self.register(canonical.clone());
            includes.push(index);
            self.parse_path(&canonical, index, ctx);
        }

        stmt.includes = Some(includes);
        Ok(())
    }
}

/// Comment text for a `"#"` pseudo-directive: the literal without its marker
fn comment_text(token: &Token) -> String {
    token.literal.strip_prefix('#').unwrap_or(&token.literal).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Payload {
        parse_string(input, &ParseOptions::default())
    }

    #[test]
    fn test_parse_minimal_string() {
        let payload = parse("events { worker_connections 1024; }");

        assert_eq!(payload.status, Status::Ok);
        assert_eq!(payload.config.len(), 1);

        let config = &payload.config[0];
        assert_eq!(config.file, "");
        assert_eq!(config.status, Status::Ok);
        assert_eq!(config.parsed.len(), 1);

        let events = &config.parsed[0];
        assert_eq!(events.name, "events");
        assert_eq!(events.line, 1);
        let block = events.block.as_ref().unwrap();
        assert_eq!(block.len(), 1);
        assert_eq!(block[0].name, "worker_connections");
        assert_eq!(block[0].args, vec!["1024"]);
        assert_eq!(block[0].line, 1);
        assert!(block[0].block.is_none());
    }

    #[test]
    fn test_parse_multiple_directives() {
        let payload = parse("user nginx;\nworker_processes auto;\n");
        let parsed = &payload.config[0].parsed;

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "user");
        assert_eq!(parsed[0].line, 1);
        assert_eq!(parsed[1].name, "worker_processes");
        assert_eq!(parsed[1].line, 2);
    }

    #[test]
    fn test_parse_nested_blocks() {
        let payload = parse(
            "http {\n    server {\n        listen 80;\n        location / {\n            root /var/www;\n        }\n    }\n}\n",
        );

        let http = &payload.config[0].parsed[0];
        assert_eq!(http.name, "http");
        let server = &http.block.as_ref().unwrap()[0];
        assert_eq!(server.name, "server");
        let children = server.block.as_ref().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "listen");
        assert_eq!(children[1].name, "location");
        assert_eq!(children[1].args, vec!["/"]);
    }

    #[test]
    fn test_comments_become_pseudo_directives() {
        let payload = parse("# main config\nuser nginx;\n");
        let parsed = &payload.config[0].parsed;

        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_comment());
        assert_eq!(parsed[0].comment.as_deref(), Some(" main config"));
        assert_eq!(parsed[1].name, "user");
    }

    #[test]
    fn test_mid_statement_comment_trails_the_statement() {
        let payload = parse("user # run as\n nginx;\nevents { }\n");
        let parsed = &payload.config[0].parsed;

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].name, "user");
        assert_eq!(parsed[0].args, vec!["nginx"]);
        assert!(parsed[1].is_comment());
        assert_eq!(parsed[1].comment.as_deref(), Some(" run as"));
        assert_eq!(parsed[2].name, "events");
    }

    #[test]
    fn test_unknown_directive_strict() {
        let options = ParseOptions {
            error_on_unknown_directives: true,
            ..Default::default()
        };
        let payload = parse_string("frobnicate on;", &options);

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(config.errors.len(), 1);
        assert_eq!(config.errors[0].what, "unknown directive \"frobnicate\"");
        assert_eq!(config.errors[0].line, Some(1));
        // the directive is still recorded
        assert_eq!(config.parsed[0].name, "frobnicate");
    }

    #[test]
    fn test_wrong_context_is_recorded() {
        let payload = parse("worker_connections 1024;");

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(
            config.errors[0].what,
            "\"worker_connections\" directive is not allowed here"
        );
    }

    #[test]
    fn test_analyzer_errors_do_not_stop_parsing() {
        let payload = parse("worker_connections 1024;\nuser nginx;\n");

        let config = &payload.config[0];
        assert_eq!(config.errors.len(), 1);
        assert_eq!(config.parsed.len(), 2);
    }

    #[test]
    fn test_stop_parsing_on_error() {
        let options = ParseOptions {
            stop_parsing_on_error: true,
            ..Default::default()
        };
        let payload = parse_string("worker_connections 1024;\nuser nginx;\n", &options);

        let config = &payload.config[0];
        assert_eq!(config.errors.len(), 1);
        // parsing halted before `user`
        assert!(config.parsed.iter().all(|d| d.name != "user"));
    }

    #[test]
    fn test_stray_close_brace_is_fatal() {
        let payload = parse("user nginx;\n}\nevents { }\n");

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(config.errors[0].what, "unexpected \"}\"");
        assert_eq!(config.errors[0].line, Some(2));
        // top-level work before the error is kept
        assert_eq!(config.parsed.len(), 1);
        assert_eq!(config.parsed[0].name, "user");
    }

    #[test]
    fn test_eof_inside_block_is_fatal() {
        let payload = parse("http {\n  server {\n    listen 80;\n");

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(config.errors[0].what, "unexpected end of file, expecting \"}\"");
    }

    #[test]
    fn test_eof_mid_statement_is_fatal() {
        let payload = parse("user nginx");

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert_eq!(
            config.errors[0].what,
            "unexpected end of file, expecting \";\" or \"{\""
        );
    }

    #[test]
    fn test_unterminated_quote_is_fatal() {
        let payload = parse("root \"/var/www;\n");

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Failed);
        assert!(config.errors[0].what.contains("unclosed quote"));
    }

    #[test]
    fn test_string_parse_keeps_include_as_leaf() {
        let payload = parse("include conf.d/*.conf;");

        let config = &payload.config[0];
        assert_eq!(payload.config.len(), 1);
        let include = &config.parsed[0];
        assert!(include.is_include());
        assert_eq!(include.args, vec!["conf.d/*.conf"]);
        assert!(include.includes.is_none());
    }

    #[test]
    fn test_nested_location_context_flattens() {
        // a location directly inside a location validates as an HTTP location
        let payload = parse(
            "http {\n  server {\n    location /a {\n      location /b {\n        return 200;\n      }\n    }\n  }\n}\n",
        );

        let config = &payload.config[0];
        assert_eq!(config.status, Status::Ok, "errors: {:?}", config.errors);
    }

    #[test]
    fn test_variables_and_strings_keep_lexical_form() {
        let payload = parse("http { map $host $backend { default \"a b\"; } }");

        let map = &payload.config[0].parsed[0].block.as_ref().unwrap()[0];
        assert_eq!(map.name, "map");
        assert_eq!(map.args, vec!["$host", "$backend"]);
        let default = &map.block.as_ref().unwrap()[0];
        assert_eq!(default.args, vec!["\"a b\""]);
    }
}
