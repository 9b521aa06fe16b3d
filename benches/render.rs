//! Result Rendering Benchmarks
//!
//! Measures how long listings take to turn into terminal tables:
//! - Small store listings
//! - Large clothing listings
//! - Value formatting on its own

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use closetly::catalog::{CLOTHES_COLUMNS, STORE_COLUMNS};
use closetly::display::{format_value, render};
use closetly::QueryResult;
use serde_json::json;

fn clothes(rows: usize) -> QueryResult {
    let rows = (0..rows)
        .map(|i| {
            vec![
                json!(i),
                json!("sweatshirt"),
                json!("M"),
                json!("unisex"),
                json!("grey"),
                json!(format!("Brand {i}")),
                json!("Reverse weave crewneck with ribbed cuffs"),
                json!(format!("https://img.example/{i}.png")),
                json!("sporty"),
                if i % 3 == 0 { json!(null) } else { json!("Thrift Co") },
            ]
        })
        .collect();
    QueryResult::labeled(CLOTHES_COLUMNS, rows).unwrap()
}

fn store(rows: usize) -> QueryResult {
    let rows = (0..rows)
        .map(|i| {
            vec![
                json!(i),
                json!("49.99"),
                json!(15),
                json!("dress"),
                json!("S"),
                json!("black"),
                json!("Reformation"),
                json!("Slip dress"),
                json!(null),
                json!("minimal"),
            ]
        })
        .collect();
    QueryResult::labeled(STORE_COLUMNS, rows).unwrap()
}

fn bench_render_clothes(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_clothes");
    for size in [10, 100, 1000] {
        let result = clothes(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &result, |b, result| {
            b.iter(|| render(black_box(result)));
        });
    }
    group.finish();
}

fn bench_render_store(c: &mut Criterion) {
    let result = store(25);
    c.bench_function("render_store_25", |b| {
        b.iter(|| render(black_box(&result)));
    });
}

fn bench_format_value(c: &mut Criterion) {
    let values = [json!(null), json!(42), json!("denim"), json!(12.5)];
    c.bench_function("format_value", |b| {
        b.iter(|| values.iter().map(|v| format_value(black_box(v))).count());
    });
}

criterion_group!(benches, bench_render_clothes, bench_render_store, bench_format_value);
criterion_main!(benches);
