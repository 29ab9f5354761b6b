//! Benchmarks for query parsing and filtering

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use statusql::query::{clear_cache, get_or_parse};
use statusql::{parse_query, AttributeAllowList, Params};

const QUERY: &str = "host_name LIKE 'web%' AND (state = 2 OR state = 1) \
                     AND COUNT{comments} > 0 OR host.groups IN [linux,db] AND service_description != ?";

/// Create a realistic set of host/service records
fn create_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let comments: Vec<Value> = (0..i % 4)
                .map(|c| json!({"author": format!("user{}", c), "text": "ack"}))
                .collect();
            json!({
                "host_name": if i % 3 == 0 { format!("web{:03}", i) } else { format!("db{:03}", i) },
                "service_description": format!("svc{}", i % 10),
                "state": i % 4,
                "comments": comments,
                "host": {"groups": if i % 2 == 0 { vec!["linux", "web"] } else { vec!["windows", "db"] }},
            })
        })
        .collect()
}

fn benchmark_parsing(c: &mut Criterion) {
    c.bench_function("parse_query_cold", |b| {
        b.iter(|| parse_query(black_box(QUERY), Params::positional(["svc1"])))
    });

    let cached = "host_name = web001 AND (state = 2 OR state = 1)";
    clear_cache();
    c.bench_function("parse_query_cached", |b| {
        b.iter(|| get_or_parse(black_box(cached)))
    });
}

fn benchmark_filtering(c: &mut Criterion) {
    let records = create_records(1000);
    let tree = match parse_query(QUERY, Params::positional(["svc1"])) {
        Ok(tree) => tree,
        Err(err) => panic!("benchmark query failed to parse: {}", err),
    };

    c.bench_function("filter_1000_records", |b| {
        b.iter(|| tree.filter(black_box(&records), None))
    });

    let allow: AttributeAllowList = ["host_name", "state"].into_iter().collect();
    c.bench_function("copy_for_filterable", |b| {
        b.iter(|| tree.copy_for_filterable(black_box(&allow)))
    });
}

criterion_group!(benches, benchmark_parsing, benchmark_filtering);
criterion_main!(benches);
