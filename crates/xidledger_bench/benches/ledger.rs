//! Transaction manager benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;
use xidledger_bench::utils::{populated_memory_ledger, random_xids};
use xidledger_core::{LedgerConfig, TransactionManager};
use xidledger_storage::InMemoryBackend;

fn memory_ledger() -> TransactionManager {
    TransactionManager::with_backend(Box::new(InMemoryBackend::new()), &LedgerConfig::default())
        .unwrap()
}

/// Benchmark begin on an in-memory ledger.
fn bench_inmemory_begin(c: &mut Criterion) {
    let tm = memory_ledger();

    c.bench_function("inmemory_begin", |b| {
        b.iter(|| {
            let xid = tm.begin().unwrap();
            black_box(xid);
        });
    });
}

/// Benchmark a full begin + commit lifecycle on an in-memory ledger.
fn bench_inmemory_lifecycle(c: &mut Criterion) {
    let tm = memory_ledger();

    c.bench_function("inmemory_begin_commit", |b| {
        b.iter(|| {
            let xid = tm.begin().unwrap();
            tm.commit(black_box(xid)).unwrap();
        });
    });
}

/// Benchmark begin + commit on a file ledger. Each call syncs to disk.
fn bench_file_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_lifecycle");
    // Every write is fsynced
    group.sample_size(10);

    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("bench");
    let tm = TransactionManager::create(&base, &LedgerConfig::default()).unwrap();

    group.bench_function("begin", |b| {
        b.iter(|| black_box(tm.begin().unwrap()));
    });

    group.bench_function("begin_commit", |b| {
        b.iter(|| {
            let xid = tm.begin().unwrap();
            tm.commit(xid).unwrap();
        });
    });

    group.finish();
    tm.close().unwrap();
}

/// Benchmark status queries at different ledger sizes.
fn bench_status_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_query");

    for count in [1_000u64, 100_000, 1_000_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let tm = populated_memory_ledger(count);
            let xids = random_xids(count, 1024);

            let mut idx = 0;
            b.iter(|| {
                let status = tm.status(black_box(xids[idx])).unwrap();
                idx = (idx + 1) % xids.len();
                black_box(status);
            });
        });
    }

    group.finish();
}

/// Benchmark opening and validating an existing ledger file.
fn bench_file_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_open");
    group.sample_size(20);

    for count in [100u64, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let temp_dir = TempDir::new().unwrap();
            let base = temp_dir.path().join("bench");
            let image = xidledger_bench::utils::random_image(count);
            std::fs::write(xidledger_core::ledger::ledger_path(&base), image).unwrap();

            b.iter(|| {
                let tm = TransactionManager::open(&base, &LedgerConfig::default()).unwrap();
                black_box(tm.last_xid().unwrap());
                tm.close().unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_inmemory_begin,
    bench_inmemory_lifecycle,
    bench_file_lifecycle,
    bench_status_query,
    bench_file_open,
);

criterion_main!(benches);
