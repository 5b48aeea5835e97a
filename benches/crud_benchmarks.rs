use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeSet;
use std::hint::black_box;
use tree24::Tree24;

const N: usize = 10_000;

// ─── Key sequences ──────────────────────────────────────────────────────────

fn random_keys(n: usize) -> Vec<i64> {
    // Deterministic LCG so runs are comparable.
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn key_orders() -> [(&'static str, Vec<i64>); 3] {
    [
        ("ordered", (0..N as i64).collect()),
        ("reverse", (0..N as i64).rev().collect()),
        ("random", random_keys(N)),
    ]
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for (order, keys) in key_orders() {
        group.bench_function(BenchmarkId::new("Tree24", order), |b| {
            b.iter(|| {
                let mut tree = Tree24::new();
                for &k in &keys {
                    let _ = tree.insert(k);
                }
                tree
            });
        });

        group.bench_function(BenchmarkId::new("BTreeSet", order), |b| {
            b.iter(|| {
                let mut set = BTreeSet::new();
                for &k in &keys {
                    set.insert(k);
                }
                set
            });
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for (order, keys) in key_orders() {
        let tree: Tree24 = keys.iter().copied().collect();
        let set: BTreeSet<i64> = keys.iter().copied().collect();

        group.bench_function(BenchmarkId::new("Tree24", order), |b| {
            b.iter(|| {
                for &k in &keys {
                    black_box(tree.search(k).ok());
                }
            });
        });

        group.bench_function(BenchmarkId::new("BTreeSet", order), |b| {
            b.iter(|| {
                for &k in &keys {
                    black_box(set.contains(&k));
                }
            });
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete");

    for (order, keys) in key_orders() {
        let tree: Tree24 = (0..N as i64).collect();
        let set: BTreeSet<i64> = (0..N as i64).collect();

        group.bench_function(BenchmarkId::new("Tree24", order), |b| {
            b.iter_batched(
                || tree.iter().collect::<Tree24>(),
                |mut tree| {
                    for &k in &keys {
                        let _ = tree.delete(k);
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(BenchmarkId::new("BTreeSet", order), |b| {
            b.iter_batched(
                || set.clone(),
                |mut set| {
                    for &k in &keys {
                        set.remove(&k);
                    }
                    set
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let keys = random_keys(N);
    let tree: Tree24 = keys.iter().copied().collect();
    let set: BTreeSet<i64> = keys.iter().copied().collect();
    let ranks: Vec<usize> = keys.iter().map(|&k| k.unsigned_abs() as usize % set.len() + 1).collect();

    group.bench_function(BenchmarkId::new("Tree24", N), |b| {
        b.iter(|| {
            for &rank in &ranks {
                black_box(tree.select(rank).ok());
            }
        });
    });

    // BTreeSet has no rank index, so a sample of the ranks is enough to show the gap.
    group.bench_function(BenchmarkId::new("BTreeSet", N), |b| {
        b.iter(|| {
            for &rank in ranks.iter().take(100) {
                black_box(set.iter().nth(rank - 1));
            }
        });
    });

    group.finish();
}

criterion_group!(crud_benches, bench_insert, bench_search, bench_delete);

criterion_group!(order_statistic_benches, bench_select);

criterion_main!(crud_benches, order_statistic_benches);
