//! ember benchmark suite.
//!
//! Benchmarks for the per-page hot path:
//! - row transformation
//! - bulk payload encoding

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

mod bench_utils;

use ember::sink::BulkBatch;
use ember::transform::{CanonicalRecord, transform};

/// Benchmarks for raw row validation and coercion.
fn transform_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for size in [100, 1000, 10000] {
        let rows = bench_utils::generate_rows(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("transform_page", size), &rows, |b, rows| {
            b.iter(|| {
                rows.iter()
                    .cloned()
                    .filter_map(|raw| transform(raw).ok())
                    .count()
            });
        });
    }

    group.finish();
}

/// Benchmarks for `_bulk` NDJSON encoding.
fn bulk_encoding_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_encoding");

    for size in [100, 1000, 10000] {
        let records: Vec<CanonicalRecord> = bench_utils::generate_rows(size)
            .into_iter()
            .filter_map(|raw| transform(raw).ok())
            .collect();
        group.throughput(Throughput::Elements(records.len() as u64));

        group.bench_with_input(BenchmarkId::new("build", size), &records, |b, records| {
            b.iter(|| BulkBatch::build(records, "fire-incidents").unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, transform_benchmarks, bulk_encoding_benchmarks);
criterion_main!(benches);
