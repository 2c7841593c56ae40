//! Criterion benchmarks for blocktime-core hot paths.
//!
//! Covers: local lookup over a dense index, merge with view rebuild,
//! interpolation and pattern formatting.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blocktime_core::estimator::estimate_height;
use blocktime_core::format::format;
use blocktime_core::types::{Bracket, ReferencePoint};
use blocktime_core::HistoryIndex;

/// `n` blocks at a steady 600 s spacing, every third one missing.
fn sparse_points(n: u64) -> Vec<ReferencePoint> {
    (0..n)
        .filter(|h| h % 3 != 1)
        .map(|h| ReferencePoint::new(h, 1_231_006_505 + h as i64 * 600))
        .collect()
}

fn bench_local_lookup(c: &mut Criterion) {
    let index = HistoryIndex::from_points(sparse_points(100_000));
    let target = 1_231_006_505 + 51_234 * 600 + 17;

    c.bench_function("local_lookup_100k", |b| {
        b.iter(|| index.local_lookup(black_box(target)))
    });
}

fn bench_merge(c: &mut Criterion) {
    let base = sparse_points(10_000);
    let window: Vec<ReferencePoint> = (5_000..5_015)
        .map(|h| ReferencePoint::new(h, 1_231_006_505 + h as i64 * 600))
        .collect();

    c.bench_function("merge_window_into_10k", |b| {
        b.iter(|| {
            let mut index = HistoryIndex::from_points(base.iter().copied());
            index.merge(black_box(window.iter().copied()))
        })
    });
}

fn bench_estimate(c: &mut Criterion) {
    let bracket = Bracket::new(
        ReferencePoint::new(807_500, 1_694_628_304),
        ReferencePoint::new(807_619, 1_694_692_419),
    );

    c.bench_function("estimate_height", |b| {
        b.iter(|| estimate_height(black_box(1_694_650_000), &bracket, Some(807_619)))
    });
}

fn bench_format(c: &mut Criterion) {
    c.bench_function("format_mixed_pattern", |b| {
        b.iter(|| format(black_box(732_861), "h [halving, block] bb (-%% [to go])", ","))
    });
}

criterion_group!(benches, bench_local_lookup, bench_merge, bench_estimate, bench_format);
criterion_main!(benches);
