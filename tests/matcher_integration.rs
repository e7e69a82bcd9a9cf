//! Integration tests for nginx location selection

use ngx_config::{match_location, parse_string, Error, ParseOptions};

fn payload(locations: &str) -> ngx_config::ast::Payload {
    let conf = format!("http {{ server {{ {locations} }} }}");
    parse_string(&conf, &ParseOptions::default())
}

#[test]
fn test_exact_match_wins_over_prefix_and_regex() {
    let payload = payload(
        "location / { return 200; }\n\
         location = /foo { return 201; }\n\
         location ~ ^/foo$ { return 202; }",
    );

    let matched = match_location(&payload, "/foo").unwrap();
    assert_eq!(matched.modifier, "=");
    assert_eq!(matched.path, "/foo");
}

#[test]
fn test_prefix_priority_skips_regex() {
    let payload = payload(
        "location ^~ /static/ { return 1; }\n\
         location ~ \\.png$ { return 2; }",
    );

    let matched = match_location(&payload, "/static/logo.png").unwrap();
    assert_eq!(matched.modifier, "^~");
    assert_eq!(matched.path, "/static/");
}

#[test]
fn test_regex_wins_before_longest_prefix_fallback() {
    let payload = payload(
        "location / { return 1; }\n\
         location ~ \\.php$ { return 2; }",
    );

    let matched = match_location(&payload, "/a/b.php").unwrap();
    assert_eq!(matched.modifier, "~");
    assert_eq!(matched.path, "\\.php$");

    let matched = match_location(&payload, "/a/b.html").unwrap();
    assert_eq!(matched.modifier, "");
    assert_eq!(matched.path, "/");
}

#[test]
fn test_regexes_match_in_source_order() {
    let payload = payload(
        "location ~ \\.ph { return 1; }\n\
         location ~ \\.php$ { return 2; }",
    );

    let matched = match_location(&payload, "/index.php").unwrap();
    assert_eq!(matched.directives[0].args, vec!["1"]);
}

#[test]
fn test_matched_directives_are_returned() {
    let payload = payload(
        "location = /foo {\n\
             return 201;\n\
             add_header X-Match foo;\n\
         }",
    );

    let matched = match_location(&payload, "/foo").unwrap();
    assert_eq!(matched.directives.len(), 2);
    assert_eq!(matched.directives[0].name, "return");
    assert_eq!(matched.directives[1].name, "add_header");
    assert_eq!(matched.directives[1].args, vec!["X-Match", "foo"]);
}

#[test]
fn test_full_url_target_is_reduced_to_its_path() {
    let payload = payload("location ^~ /static/ { return 1; }");

    let matched =
        match_location(&payload, "https://example.com:8443/static/app.js?v=3#frag").unwrap();
    assert_eq!(matched.path, "/static/");
}

#[test]
fn test_no_locations_error() {
    let conf = parse_string("events { worker_connections 1024; }", &ParseOptions::default());
    let err = match_location(&conf, "/foo").unwrap_err();
    assert_eq!(err.to_string(), "no location(s) found");
    assert!(matches!(err, Error::NoLocations));
}

#[test]
fn test_no_match_error() {
    let payload = payload("location = /foo { return 1; }");
    let err = match_location(&payload, "/bar").unwrap_err();
    assert_eq!(err.to_string(), "no match found");
    assert!(matches!(err, Error::NoMatch));
}

#[test]
fn test_regex_compile_failure_surfaces() {
    let payload = payload("location ~ [ { return 1; }");
    let err = match_location(&payload, "/anything").unwrap_err();
    assert!(matches!(err, Error::Regex(_)));
}

#[test]
fn test_locations_in_nested_blocks_are_found() {
    let conf = r"
http {
    server {
        location /outer {
            return 1;
            location /outer/inner { return 2; }
        }
    }
}
";
    let payload = parse_string(conf, &ParseOptions::default());

    let matched = match_location(&payload, "/outer/inner/x").unwrap();
    assert_eq!(matched.path, "/outer/inner");
}

#[test]
fn test_case_insensitive_regex_modifier() {
    let payload = payload(
        "location ~* ^/img/.*\\.jpg$ { return 1; }\n\
         location / { return 2; }",
    );

    let matched = match_location(&payload, "/IMG/cat.JPG").unwrap();
    assert_eq!(matched.modifier, "~*");

    let matched = match_location(&payload, "/img/cat.gif").unwrap();
    assert_eq!(matched.modifier, "");
}
