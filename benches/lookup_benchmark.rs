//! Benchmarks for region database lookups.
//!
//! Run with: cargo bench
//!
//! Measures:
//! - Lookup throughput per search mode (memory, mapped, disk)
//! - Cached lookups (hit and miss)
//! - Scalability with database size
//! - Hot reload cost

#[path = "../src/binary/fixture.rs"]
mod fixture;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipcity::{CachedDatabase, Database, SearchMode};
use std::io::Write;
use tempfile::NamedTempFile;

const BASE: u32 = 0x0100_0000;
const WIDTH: u32 = 4096;

/// Write a generated database with `count` ranges to a temp file.
fn generate_db(count: u32) -> (NamedTempFile, Vec<u8>) {
    // Keep every partition reachable from the 1024-entry header block
    let data = fixture::sequential(count, BASE, WIDTH)
        .entries_per_block(count as usize / 1000 + 1)
        .build();
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(&data).expect("write database");
    file.flush().expect("flush database");
    (file, data)
}

/// Spread `count` keys over the covered space, gaps included.
fn generate_keys(count: usize, ranges: u32) -> Vec<u32> {
    let span = ranges as u64 * WIDTH as u64 * 4 / 3;
    (0..count as u64)
        .map(|i| BASE + ((i * 7_919 * WIDTH as u64 + i) % span) as u32)
        .collect()
}

fn bench_search_modes(c: &mut Criterion) {
    let (file, _) = generate_db(10_000);
    let keys = generate_keys(1000, 10_000);

    let mut group = c.benchmark_group("search_mode");
    group.throughput(Throughput::Elements(keys.len() as u64));

    for mode in [SearchMode::Memory, SearchMode::Mapped, SearchMode::Disk] {
        let db = Database::open(file.path(), mode).expect("open database");
        group.bench_function(mode.name(), |b| {
            b.iter(|| {
                for &key in &keys {
                    black_box(db.search(black_box(key)).ok());
                }
            })
        });
    }

    group.finish();
}

fn bench_cached_lookup(c: &mut Criterion) {
    let (_file, data) = generate_db(10_000);
    let keys = generate_keys(1000, 10_000);

    let mut group = c.benchmark_group("cached_lookup");

    let cached = CachedDatabase::with_database(
        Database::from_bytes(data.clone()).expect("load database"),
        10_000,
    );
    for &key in &keys {
        let _ = cached.search(key);
    }
    group.bench_function("cache_hit", |b| {
        b.iter(|| black_box(cached.search(black_box(keys[42])).ok()))
    });

    let uncached =
        CachedDatabase::with_database(Database::from_bytes(data).expect("load database"), 0);
    group.bench_function("cache_disabled", |b| {
        b.iter(|| black_box(uncached.search(black_box(keys[42])).ok()))
    });

    group.bench_function("address_parse", |b| {
        b.iter(|| black_box(cached.lookup(black_box("1.2.3.4")).ok()))
    });

    group.finish();
}

fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100u32, 10_000, 200_000].iter() {
        let (file, _) = generate_db(*size);
        let keys = generate_keys(100, *size);
        group.throughput(Throughput::Elements(keys.len() as u64));

        for mode in [SearchMode::Memory, SearchMode::Disk] {
            let db = Database::open(file.path(), mode).expect("open database");
            group.bench_with_input(BenchmarkId::new(mode.name(), size), size, |b, _| {
                b.iter(|| {
                    for &key in &keys {
                        black_box(db.search(key).ok());
                    }
                })
            });
        }
    }

    group.finish();
}

fn bench_hot_reload(c: &mut Criterion) {
    let (file, _) = generate_db(10_000);
    let db = CachedDatabase::open(file.path(), SearchMode::Disk).expect("open database");

    let mut group = c.benchmark_group("hot_reload");
    group.bench_function("reload_disk_10k", |b| {
        b.iter(|| db.reload(file.path()).expect("reload"))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_search_modes,
    bench_cached_lookup,
    bench_scalability,
    bench_hot_reload
);
criterion_main!(benches);
