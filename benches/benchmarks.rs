//! Performance benchmarks for pull-benchmark
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pull_benchmark::analyze::summary;
use pull_benchmark::measure::events::{parse_go_duration, parse_pull_message};

/// Benchmark extracting pull durations from kubelet event messages
fn bench_pull_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("pull_message");

    let messages = [
        (
            "with_waiting",
            "Successfully pulled image \"docker.io/library/nginx:mainline-alpine\" in 873.420598ms (873.428863ms including waiting)",
        ),
        (
            "without_waiting",
            "Successfully pulled image \"ghcr.io/spegel-org/benchmark:v1-1GB-4\" in 1m2.5s",
        ),
    ];
    for (name, message) in messages {
        group.bench_with_input(BenchmarkId::new("parse", name), message, |b, msg| {
            b.iter(|| parse_pull_message(black_box(msg)))
        });
    }

    group.bench_function("go_duration", |b| {
        b.iter(|| parse_go_duration(black_box("1h2m3.456789s")))
    });

    group.finish();
}

/// Benchmark summary statistics over growing samples
fn bench_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("summary");

    for size in [10, 100, 1000].iter() {
        // node pull times in seconds, deliberately unsorted
        let sample: Vec<f64> = (0..*size)
            .map(|i| ((i * 7919) % 1000) as f64 / 100.0)
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("summary", size), &sample, |b, s| {
            b.iter(|| summary(black_box(s)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pull_message, bench_summary);
criterion_main!(benches);
