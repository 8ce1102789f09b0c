//! Size estimation, splitting and chunking benchmarks.

use bigdoc_codec::{size_of_entry, CborEncoding, Encoding, JsonEncoding};
use bigdoc_core::{chunk_record, reassemble, Config, Manifest, Part, Record, WriteToken};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

/// Create a record with `fields` small fields and one field of `big` chars.
fn mixed_record(fields: usize, big: usize) -> Record {
    let mut record: Record = (0..fields)
        .map(|i| (format!("field_{i:04}"), json!({"n": i, "label": "small value"})))
        .collect();
    record.insert("blob".into(), Value::String("y".repeat(big)));
    record
}

/// Benchmark size estimation.
fn bench_size_of_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_of_entry");

    for len in [1_024, 65_536, 1_048_576].iter() {
        let value = Value::String("x".repeat(*len));
        group.throughput(Throughput::Bytes(*len as u64));
        group.bench_with_input(BenchmarkId::new("json", len), &value, |b, value| {
            b.iter(|| black_box(JsonEncoding.size_of_entry("k", black_box(value)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("cbor", len), &value, |b, value| {
            b.iter(|| black_box(CborEncoding.size_of_entry("k", black_box(value)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark chunking records of growing size.
fn bench_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk");
    let config = Config::default();

    for big in [0, 500_000, 2_000_000, 8_000_000].iter() {
        let record = mixed_record(100, *big);
        let bytes = record
            .iter()
            .map(|(k, v)| size_of_entry(k, v).unwrap())
            .sum::<usize>();
        group.throughput(Throughput::Bytes(bytes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(big), &record, |b, record| {
            b.iter(|| black_box(chunk_record(black_box(record), &config).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark reassembling parts into a record.
fn bench_reassemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("reassemble");
    let config = Config::new().ceiling(100_000);

    for big in [100_000, 1_000_000, 4_000_000].iter() {
        let record = mixed_record(100, *big);
        let chunks = chunk_record(&record, &config).unwrap();
        let token = WriteToken::new();
        let manifest = Manifest::for_write(chunks.len() as u32, token, None);
        let parts: Vec<Part> = (0u32..)
            .zip(&chunks)
            .map(|(i, chunk)| Part {
                part_index: i,
                generation: manifest.generation,
                write_token: token,
                data: chunk.to_data(),
            })
            .collect();

        group.throughput(Throughput::Bytes(*big as u64));
        group.bench_with_input(BenchmarkId::from_parameter(big), &parts, |b, parts| {
            b.iter(|| black_box(reassemble(&manifest, parts.clone()).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_size_of_entry, bench_chunk, bench_reassemble);

criterion_main!(benches);
