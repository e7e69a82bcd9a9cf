//! Benchmark for parser performance
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ngx_config::{match_location, parse_string, ParseOptions};

fn bench_parse_simple(c: &mut Criterion) {
    let config = r#"
        user nginx;
        worker_processes auto;
    "#;

    c.bench_function("parse_simple", |b| {
        b.iter(|| {
            let _ = parse_string(black_box(config), &ParseOptions::default());
        });
    });
}

fn bench_parse_server(c: &mut Criterion) {
    let config = r#"
        events { worker_connections 1024; }
        http {
            sendfile on;
            keepalive_timeout 65;
            server {
                listen 80;
                server_name example.com;
                location / { root /var/www/html; }
                location ~ \.php$ { return 404; }
                location ^~ /static/ { expires 30d; }
            }
        }
    "#;

    c.bench_function("parse_server", |b| {
        b.iter(|| {
            let _ = parse_string(black_box(config), &ParseOptions::default());
        });
    });

    let payload = parse_string(config, &ParseOptions::default());
    c.bench_function("match_location", |b| {
        b.iter(|| {
            let _ = match_location(black_box(&payload), black_box("/static/app.js"));
        });
    });
}

criterion_group!(benches, bench_parse_simple, bench_parse_server);
criterion_main!(benches);
