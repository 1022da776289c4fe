//! Canonical AT&T encoding benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use libfst_automaton::construct::{parallel_acceptors, sigma_star};
use libfst_automaton::{AutomatonBuilder, AutomatonDescriptor, from_att, to_att};

/// Chain of `len` arcs with a back arc every 8 states, so arcs are spread
/// over many source states.
fn chain(len: u32) -> AutomatonDescriptor {
    let mut b = AutomatonBuilder::new();
    let mut cur = b.add_state();
    b.set_start(cur);
    for i in 0..len {
        let next = b.add_state();
        let label = 97 + (i % 26);
        b.add_arc(cur, next, label, label, f64::from(i % 5) * 0.25);
        if i % 8 == 7 {
            b.add_arc(next, 0, 0, 0, 1.5);
        }
        cur = next;
    }
    b.set_final(cur, 0.0);
    b.build().expect("chain is well formed")
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("att_encode");
    for &len in &[16u32, 256, 4096] {
        let fst = chain(len);
        group.bench_with_input(BenchmarkId::new("chain", len), &fst, |b, fst| {
            b.iter(|| criterion::black_box(to_att(fst)));
        });
    }
    let sigma = sigma_star(1..128).expect("sigma star");
    group.bench_function("sigma_star_127", |b| {
        b.iter(|| criterion::black_box(to_att(&sigma)));
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("att_decode");
    for &len in &[16u32, 256, 4096] {
        let text = to_att(&chain(len));
        group.bench_with_input(BenchmarkId::new("chain", len), &text, |b, text| {
            b.iter(|| criterion::black_box(from_att(text).expect("canonical text decodes")));
        });
    }
    let paths: Vec<(String, f64)> = (0..64)
        .map(|i| (format!("path{i:02}"), f64::from(i) * 0.5))
        .collect();
    let borrowed: Vec<(&str, f64)> = paths.iter().map(|(s, w)| (s.as_str(), *w)).collect();
    let text = to_att(&parallel_acceptors(&borrowed).expect("parallel paths"));
    group.bench_function("parallel_64", |b| {
        b.iter(|| criterion::black_box(from_att(&text).expect("canonical text decodes")));
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
