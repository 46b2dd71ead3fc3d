//! Storage backend benchmarks.

use btrv_storage::{FileBackend, InMemoryBackend, StorageBackend};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Write;
use tempfile::TempDir;

/// Create patterned data of given size.
fn pattern_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Benchmark InMemoryBackend whole-image reads.
fn bench_inmemory_read_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_read_all");

    for size in [4 * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let backend = InMemoryBackend::with_data(pattern_data(size));
            b.iter(|| black_box(backend.read_all().unwrap()));
        });
    }

    group.finish();
}

/// Benchmark FileBackend whole-file and page-sized reads.
fn bench_file_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_read");
    group.sample_size(50);

    for size in [64 * 1024, 1024 * 1024] {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.dat");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&pattern_data(size))
            .unwrap();
        let backend = FileBackend::open(&path).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("all", size), &backend, |b, backend| {
            b.iter(|| black_box(backend.read_all().unwrap()));
        });

        group.throughput(Throughput::Bytes(4096));
        group.bench_with_input(BenchmarkId::new("page", size), &backend, |b, backend| {
            b.iter(|| black_box(backend.read_at(black_box(4096), 4096).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inmemory_read_all, bench_file_read);
criterion_main!(benches);
