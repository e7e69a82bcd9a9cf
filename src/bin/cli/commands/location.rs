//! Location tester (lt) command implementation

use crate::cli::args::LocationArgs;
use anyhow::Result;
use colored::Colorize;
use ngx_config::ast::Directive;
use ngx_config::{match_location, parse_file, ParseOptions};

pub fn run(args: &LocationArgs) -> Result<()> {
    let options = ParseOptions {
        single_file: args.single,
        ..Default::default()
    };

    let payload = parse_file(&args.file, &options);
    if !payload.has_successful_config() {
        match payload.first_error() {
            Some(err) => anyhow::bail!("{err}"),
            None => anyhow::bail!("no configuration could be parsed"),
        }
    }

    let matched = match_location(&payload, &args.url)?;

    let modifier = if matched.modifier.is_empty() {
        "(prefix)".dimmed().to_string()
    } else {
        matched.modifier.clone()
    };
    println!("{} {}", "modifier:".bold(), modifier);
    println!("{} {}", "path:".bold(), matched.path);
    println!("{}", "directives:".bold());
    for directive in &matched.directives {
        print_directive(directive, 1);
    }

    Ok(())
}

/// Render a directive the way it would appear in a config file
fn print_directive(directive: &Directive, depth: usize) {
    let indent = "    ".repeat(depth);

    if directive.is_comment() {
        println!("{indent}#{}", directive.comment.as_deref().unwrap_or_default());
        return;
    }

    let mut line = directive.name.clone();
    for arg in &directive.args {
        line.push(' ');
        line.push_str(arg);
    }

    match &directive.block {
        Some(children) => {
            println!("{indent}{line} {{");
            for child in children {
                print_directive(child, depth + 1);
            }
            println!("{indent}}}");
        }
        None => println!("{indent}{line};"),
    }
}
