/*!
# Parser Benchmarks

Query string parsing and context dispatch.

## Usage

```bash
cargo bench --bench parser_benchmarks

# Single group
cargo bench --bench parser_benchmarks -- "Filter Grammar"

# Quick run with fewer samples
cargo bench --bench parser_benchmarks -- --quick
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use querycrate::query_parser::parse_filter;
use querycrate::{
    ContextRegistry, EntityDef, FilterContext, ParsedParams, QueryKeys, Select, SortContext,
};
use std::hint::black_box;

const FULL_QUERY: &[(&str, &str)] = &[
    ("fields", "id,first_name,last_name,messages.recipient.last_name"),
    ("filter", r#"last_name_in:["Smith",Bloggs],messages.content_not_empty"#),
    ("sort", "messages.latest,last_name_asc,first_name_asc"),
    ("with", "messages,messages.recipient"),
    ("offset", "1,messages.recipient.0"),
    ("limit", "5,messages.3"),
];

/// `count` filters, each with a quoted argument holding separators.
fn filter_expression(count: usize) -> String {
    (0..count)
        .map(|i| format!(r#"rel{i}.name_{i}:["a,b",c{i},"x \"y\" [z]"]"#))
        .collect::<Vec<_>>()
        .join(",")
}

fn bench_grammar(c: &mut Criterion) {
    let keys = QueryKeys::default();
    let mut group = c.benchmark_group("Query Grammar");

    group.bench_function("full_query_string", |b| {
        b.iter(|| ParsedParams::from_pairs(black_box(FULL_QUERY.iter().copied()), &keys));
    });

    for count in [1, 10, 100] {
        let expression = filter_expression(count);
        group.bench_with_input(
            BenchmarkId::new("Filter Grammar", count),
            &expression,
            |b, expression| b.iter(|| parse_filter(black_box(expression))),
        );
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let columns: Vec<String> = (0..50).map(|i| format!("column_{i}")).collect();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let registry = ContextRegistry::builder()
        .filter("users", vec![FilterContext::timestamps(), FilterContext::attributes(&columns)])
        .sort("users", vec![SortContext::timestamps(), SortContext::attributes(&columns)])
        .build();
    let users = EntityDef::new("users", "users");
    let args = vec!["value".to_string()];

    let mut group = c.benchmark_group("Context Dispatch");
    group.bench_function("filter_last_handler", |b| {
        b.iter(|| {
            let mut query = Select::from_entity(&users);
            registry.apply_filter(&mut query, black_box("column_49"), &args)
        });
    });
    group.bench_function("sort_normalized_name", |b| {
        b.iter(|| {
            let mut query = Select::from_entity(&users);
            registry.apply_sort(&mut query, black_box("column-49.desc"))
        });
    });
    group.bench_function("unknown_name", |b| {
        b.iter(|| {
            let mut query = Select::from_entity(&users);
            registry.apply_filter(&mut query, black_box("password"), &args)
        });
    });
    group.finish();
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .warm_up_time(std::time::Duration::from_secs(1))
        .with_plots()
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_grammar, bench_dispatch
}
criterion_main!(benches);
