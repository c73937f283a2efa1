// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Benchmarks for the URL classifier and the filter pipeline.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Value;

use pagetap::capture::classify;
use pagetap::{CapturedRequest, FilterCriteria};

fn classifier_benchmark(c: &mut Criterion) {
    let urls = [
        "https://api.example.com/v1/users?page=2",
        "https://cdn.example.com/assets/logo.png?v=abc123",
        "https://tracker.ads.net/pixel.gif",
        "https://sub.domain.example.org/deep/path/data.json",
    ];

    c.bench_function("classify/url_is_image", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(classify::url_is_image(black_box(url)));
            }
        })
    });

    c.bench_function("classify/url_is_domain", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(classify::url_is_domain(black_box(url), "example.com"));
            }
        })
    });
}

fn filter_benchmark(c: &mut Criterion) {
    let records: Vec<CapturedRequest> = (0..1000)
        .map(|i| CapturedRequest {
            url: format!("https://api.example.com/v1/items/{}?page=1", i),
            method: "GET".to_string(),
            request_headers: BTreeMap::new(),
            request_body: None,
            response_headers: BTreeMap::new(),
            response_code: Some(if i % 7 == 0 { 301 } else { 200 }),
            response_body: Value::String(String::new()),
            elapsed_ms: i as f64,
            is_cached: false,
        })
        .collect();

    let criteria = FilterCriteria::new()
        .include_domain("example.com")
        .url_contains("/v1/")
        .ignore_redirects(true);

    c.bench_function("filter/1000_records", |b| {
        b.iter(|| black_box(criteria.apply(black_box(records.clone()))))
    });
}

criterion_group!(benches, classifier_benchmark, filter_benchmark);
criterion_main!(benches);
