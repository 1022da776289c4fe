//! Benchmark report rendering benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use libfst_harness::config::BenchPreset;
use libfst_harness::report::{BenchmarkResult, parse_jsonl, render_jsonl, render_report};
use libfst_harness::scenario::build_matrix;

/// One synthetic result per row of the `profile` matrix, repeated `copies` times.
fn profile_results(copies: usize) -> Vec<BenchmarkResult> {
    let preset = BenchPreset::Profile;
    let rows = build_matrix(preset.scenarios(), preset.lengths(), preset.params());
    rows.iter()
        .cycle()
        .take(rows.len() * copies)
        .enumerate()
        .map(|(i, row)| {
            let avg = 1_000.0 + row.len as f64 * 37.5 + i as f64;
            let record = serde_json::json!({
                "scenario": row.scenario,
                "len": row.len,
                "transducer_len": row.transducer_len,
                "branches": row.branches,
                "iters": row.iters,
                "avg_ns": avg,
                "min_ns": avg * 0.9,
                "max_ns": avg * 1.4,
                "avg_states": row.len * 3,
            });
            BenchmarkResult::parse(&record.to_string()).expect("synthetic record is valid")
        })
        .collect()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_report");
    for &copies in &[1usize, 10, 100] {
        let results = profile_results(copies);
        group.bench_with_input(
            BenchmarkId::new("rows", results.len()),
            &results,
            |b, results| {
                b.iter(|| criterion::black_box(render_report(results)));
            },
        );
    }
    group.finish();
}

fn bench_parse_jsonl(c: &mut Criterion) {
    let text = render_jsonl(&profile_results(10));
    c.bench_function("parse_jsonl_700", |b| {
        b.iter(|| criterion::black_box(parse_jsonl(&text).expect("echo re-parses")));
    });
}

criterion_group!(benches, bench_render, bench_parse_jsonl);
criterion_main!(benches);
