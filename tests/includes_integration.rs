//! Integration tests for include expansion across files

use std::fs;
use std::path::Path;

use ngx_config::ast::Status;
use ngx_config::{parse_file, ParseOptions};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn test_include_glob_expansion() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nginx.conf", "user nginx;\ninclude conf.d/*.conf;\nevents { }\n");
    write(dir.path(), "conf.d/a.conf", "worker_rlimit_nofile 8192;\n");
    write(dir.path(), "conf.d/b.conf", "pid /run/nginx.pid;\n");

    let payload = parse_file(dir.path().join("nginx.conf"), &ParseOptions::default());

    assert_eq!(payload.status, Status::Ok);
    assert_eq!(payload.config.len(), 3);

    // entry first, then glob matches in sorted order
    assert!(payload.config[0].file.ends_with("nginx.conf"));
    assert!(payload.config[1].file.ends_with("a.conf"));
    assert!(payload.config[2].file.ends_with("b.conf"));

    let include = &payload.config[0].parsed[1];
    assert!(include.is_include());
    assert_eq!(include.includes.as_deref(), Some(&[1, 2][..]));

    assert_eq!(payload.config[1].parsed[0].name, "worker_rlimit_nofile");
    assert_eq!(payload.config[2].parsed[0].name, "pid");
}

#[test]
fn test_include_cycle_parses_each_file_once() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.conf", "include b.conf;\nuser nginx;\n");
    write(dir.path(), "b.conf", "include a.conf;\npid /run/nginx.pid;\n");

    let payload = parse_file(dir.path().join("a.conf"), &ParseOptions::default());

    // terminates, and each file appears exactly once
    assert_eq!(payload.config.len(), 2);
    assert!(payload.config[0].file.ends_with("a.conf"));
    assert!(payload.config[1].file.ends_with("b.conf"));

    // b's include resolves to a reference back to the entry config
    let include_in_b = &payload.config[1].parsed[0];
    assert_eq!(include_in_b.includes.as_deref(), Some(&[0][..]));
}

#[test]
fn test_self_include_resolves_to_self() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.conf", "include a.conf;\nuser nginx;\n");

    let payload = parse_file(dir.path().join("a.conf"), &ParseOptions::default());

    assert_eq!(payload.config.len(), 1);
    assert_eq!(payload.config[0].parsed[0].includes.as_deref(), Some(&[0][..]));
}

#[test]
fn test_repeated_include_is_not_reparsed() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "nginx.conf",
        "include shared.conf;\ninclude shared.conf;\n",
    );
    write(dir.path(), "shared.conf", "user nginx;\n");

    let payload = parse_file(dir.path().join("nginx.conf"), &ParseOptions::default());

    assert_eq!(payload.config.len(), 2);
    assert_eq!(payload.config[0].parsed[0].includes.as_deref(), Some(&[1][..]));
    assert_eq!(payload.config[0].parsed[1].includes.as_deref(), Some(&[1][..]));
}

#[test]
fn test_single_file_keeps_include_as_leaf() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nginx.conf", "include conf.d/*.conf;\nevents { }\n");
    write(dir.path(), "conf.d/a.conf", "user nginx;\n");

    let options = ParseOptions {
        single_file: true,
        ..Default::default()
    };
    let payload = parse_file(dir.path().join("nginx.conf"), &options);

    assert_eq!(payload.config.len(), 1);
    let include = &payload.config[0].parsed[0];
    assert!(include.is_include());
    assert!(include.includes.is_none());
}

#[test]
fn test_empty_glob_is_tolerated() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nginx.conf", "include missing/*.conf;\nuser nginx;\n");

    let payload = parse_file(dir.path().join("nginx.conf"), &ParseOptions::default());

    assert_eq!(payload.status, Status::Ok);
    assert_eq!(payload.config.len(), 1);
    assert_eq!(payload.config[0].status, Status::Ok);
    assert_eq!(payload.config[0].parsed[0].includes.as_deref(), Some(&[][..]));
}

#[test]
fn test_errors_stay_with_their_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nginx.conf", "include bad.conf;\nuser nginx;\n");
    write(dir.path(), "bad.conf", "worker_connections 1024;\n");

    let payload = parse_file(dir.path().join("nginx.conf"), &ParseOptions::default());

    assert_eq!(payload.config[0].status, Status::Ok);
    assert_eq!(payload.config[1].status, Status::Failed);

    let err = &payload.config[1].errors[0];
    assert_eq!(err.what, "\"worker_connections\" directive is not allowed here");
    assert!(err.file.as_deref().unwrap().ends_with("bad.conf"));
    assert_eq!(err.line, Some(1));
}

#[test]
fn test_combine_configs_flattens_includes_in_place() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nginx.conf", "user nginx;\ninclude extra.conf;\nevents { }\n");
    write(dir.path(), "extra.conf", "pid /run/nginx.pid;\n");

    let options = ParseOptions {
        combine_configs: true,
        ..Default::default()
    };
    let payload = parse_file(dir.path().join("nginx.conf"), &options);

    assert_eq!(payload.config.len(), 1);
    let combined = &payload.config[0];
    assert!(combined.file.ends_with("nginx.conf"));

    let names: Vec<&str> = combined.parsed.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["user", "pid", "events"]);
    assert!(combined.parsed[1].file.as_deref().unwrap().ends_with("extra.conf"));
}

#[test]
fn test_missing_entry_file_fails_the_payload() {
    let dir = tempdir().unwrap();

    let payload = parse_file(dir.path().join("nope.conf"), &ParseOptions::default());

    assert_eq!(payload.status, Status::Failed);
    assert!(payload.config.is_empty());
    assert_eq!(payload.errors.len(), 1);
    assert!(payload.errors[0].file.as_deref().unwrap().ends_with("nope.conf"));
}

#[test]
fn test_locations_across_included_files_are_matched() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "nginx.conf",
        "http {\n  include sites/*.conf;\n}\n",
    );
    write(
        dir.path(),
        "sites/app.conf",
        "server {\n  location ^~ /static/ { return 1; }\n}\n",
    );

    let payload = parse_file(dir.path().join("nginx.conf"), &ParseOptions::default());
    let matched = ngx_config::match_location(&payload, "/static/logo.png").unwrap();
    assert_eq!(matched.modifier, "^~");
    assert_eq!(matched.path, "/static/");
}
