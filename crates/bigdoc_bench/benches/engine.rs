//! Engine operation benchmarks.

use bigdoc_core::{Config, PartStore, Record};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

/// Create a record whose total size is roughly `size` bytes.
fn record_of_size(size: usize) -> Record {
    let mut record = Record::new();
    record.insert("name".into(), json!("Trattoria"));
    record.insert("body".into(), Value::String("m".repeat(size)));
    record
}

/// Benchmark full writes.
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.sample_size(20);

    for size in [1_024, 512_000, 2_000_000, 8_000_000].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let engine = PartStore::in_memory(Config::default()).unwrap();
            let record = record_of_size(size);

            b.iter(|| {
                black_box(engine.write("bench", "r", black_box(&record)).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark full reads.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");
    group.sample_size(20);

    for size in [1_024, 512_000, 2_000_000, 8_000_000].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let engine = PartStore::in_memory(Config::default()).unwrap();
            engine.write("bench", "r", &record_of_size(size)).unwrap();

            b.iter(|| {
                black_box(engine.read("bench", black_box("r")).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark overwriting a record many times.
fn bench_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("overwrite");
    let engine = PartStore::in_memory(Config::new().ceiling(10_000)).unwrap();
    let record = record_of_size(200_000);
    engine.write("bench", "r", &record).unwrap();

    group.bench_function("200k_at_10k_ceiling", |b| {
        b.iter(|| {
            black_box(engine.write("bench", "r", black_box(&record)).unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_write, bench_read, bench_overwrite);

criterion_main!(benches);
