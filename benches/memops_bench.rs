//! Dispatched primitives against the standard library
//!
//! Sizes follow the copy tiers: head/tail only, the aligned loop, the rep
//! window and the streaming window. `copy_from_slice` and friends lower to
//! the platform libc, which makes them the natural baseline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tiermem::memory::{compare_slices, copy_slice, fill_slice, find_byte, move_within};

//==============================================================================
// TEST DATA GENERATION
//==============================================================================

fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| ((i * 17 + 13) % 251) as u8).collect()
}

const SIZES: &[(&str, usize)] = &[
    ("tiny_8B", 8),
    ("small_64B", 64),
    ("small_256B", 256),
    ("medium_1KB", 1024),
    ("medium_4KB", 4096),
    ("medium_16KB", 16 * 1024),
    ("large_256KB", 256 * 1024),
    ("large_1MB", 1024 * 1024),
    ("huge_32MB", 32 * 1024 * 1024),
];

//==============================================================================
// COPY / MOVE
//==============================================================================

fn bench_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy");
    for &(name, size) in SIZES {
        let src = generate_test_data(size);
        let mut dst = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("tiermem", name), &size, |b, _| {
            b.iter(|| copy_slice(black_box(&mut dst), black_box(&src)))
        });
        group.bench_with_input(BenchmarkId::new("std", name), &size, |b, _| {
            b.iter(|| black_box(&mut dst).copy_from_slice(black_box(&src)))
        });
    }
    group.finish();
}

fn bench_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_overlapping");
    for &(name, size) in &SIZES[..SIZES.len() - 1] {
        let mut buf = generate_test_data(size + 64);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("tiermem_up", name), &size, |b, &n| {
            b.iter(|| move_within(black_box(&mut buf), 0..n, 33))
        });
        group.bench_with_input(BenchmarkId::new("tiermem_down", name), &size, |b, &n| {
            b.iter(|| move_within(black_box(&mut buf), 33..33 + n, 0))
        });
        group.bench_with_input(BenchmarkId::new("std_up", name), &size, |b, &n| {
            b.iter(|| black_box(&mut buf).copy_within(0..n, 33))
        });
    }
    group.finish();
}

//==============================================================================
// SET / COMPARE / SEARCH
//==============================================================================

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    for &(name, size) in SIZES {
        let mut dst = vec![0u8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("tiermem", name), &size, |b, _| {
            b.iter(|| fill_slice(black_box(&mut dst), black_box(0x5A)))
        });
        group.bench_with_input(BenchmarkId::new("std", name), &size, |b, _| {
            b.iter(|| black_box(&mut dst).fill(black_box(0x5A)))
        });
    }
    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_equal");
    for &(name, size) in &SIZES[..SIZES.len() - 1] {
        let a = generate_test_data(size);
        let b_buf = a.clone();
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("tiermem", name), &size, |b, _| {
            b.iter(|| compare_slices(black_box(&a), black_box(&b_buf)))
        });
        group.bench_with_input(BenchmarkId::new("std", name), &size, |b, _| {
            b.iter(|| black_box(&a[..]).cmp(black_box(&b_buf[..])))
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_last_byte");
    for &(name, size) in &SIZES[..SIZES.len() - 1] {
        let mut hay = vec![0u8; size];
        hay[size - 1] = 0xFF;
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("tiermem", name), &size, |b, _| {
            b.iter(|| find_byte(black_box(&hay), 0xFF))
        });
        group.bench_with_input(BenchmarkId::new("std", name), &size, |b, _| {
            b.iter(|| black_box(&hay).iter().position(|&x| x == 0xFF))
        });
    }
    group.finish();
}

//==============================================================================
// STRINGS
//==============================================================================

fn bench_strlen(c: &mut Criterion) {
    let mut group = c.benchmark_group("strlen");
    for len in [15usize, 100, 1000, 10_000] {
        let mut s = vec![b'x'; len];
        s.push(0);
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("tiermem", len), &len, |b, _| {
            b.iter(|| unsafe { tiermem::strlen(black_box(s.as_ptr())) })
        });
        group.bench_with_input(BenchmarkId::new("std", len), &len, |b, _| {
            b.iter(|| black_box(&s).iter().position(|&x| x == 0))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_copy,
    bench_move,
    bench_fill,
    bench_compare,
    bench_find,
    bench_strlen
);
criterion_main!(benches);
