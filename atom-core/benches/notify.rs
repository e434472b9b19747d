//! Benchmarks for notification fan-out and derived atoms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use atom_core::get;
use atom_core::reactive::{atom, Subscription};
use atom_core::stream::operators::map;

/// Benchmark `set` with a varying number of subscribers
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for subscribers in [1, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("subscribers", subscribers),
            &subscribers,
            |b, &count| {
                let value = atom(0u64);
                let _subs: Vec<Subscription> = (0..count)
                    .map(|_| value.subscribe(|v| {
                        black_box(v);
                    }))
                    .collect();

                let mut next = 0u64;
                b.iter(|| {
                    next += 1;
                    value.set(black_box(next));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark propagation through a chain of mapped atoms
fn bench_map_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_chain");

    for depth in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let root = atom(0u64);
            let mut leaf = root.map(|v| v + 1);
            for _ in 1..depth {
                leaf = leaf.map(|v| v + 1);
            }

            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                root.set(next);
                black_box(leaf.get());
            });
        });
    }

    group.finish();
}

/// Benchmark the universal getter on a piped stream
fn bench_get_piped(c: &mut Criterion) {
    let value = atom(7u64);
    let piped = value.pipe(map(|i: &u64| i * i)).pipe(map(|i: &u64| i + 1));

    c.bench_function("get_piped", |b| {
        b.iter(|| black_box(get(&piped)));
    });
}

criterion_group!(benches, bench_fan_out, bench_map_chain, bench_get_piped);
criterion_main!(benches);
