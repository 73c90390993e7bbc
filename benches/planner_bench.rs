//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Deterministic random-ish tree: node i + 2 hangs off node (i / 3) + 1, so
/// fan-out is 3 and depth grows logarithmically.
fn build_tree(nodes: usize) -> (Vec<u64>, Vec<u64>, Vec<f64>, Vec<String>) {
    let mut ids = vec![1u64];
    let mut parents = vec![0u64];
    let mut weights = vec![1.0f64];
    for i in 0..nodes - 1 {
        ids.push(2 + i as u64);
        parents.push((i / 3) as u64 + 1);
        weights.push(((i * 2654435761) % 97) as f64 / 10.0);
    }
    let labels = ids.iter().map(|id| format!("node-{id}")).collect();
    (ids, parents, weights, labels)
}

fn benchmark_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy");
    for nodes in [1_000, 10_000, 100_000] {
        let (ids, parents, weights, labels) = build_tree(nodes);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| {
                let out = canopy::greedy(&ids, &parents, &weights, &labels, 50)
                    .expect("planning succeeds");
                black_box(out.entropies);
            });
        });
    }
    group.finish();
}

fn benchmark_exact(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact");
    for nodes in [100, 500, 2_000] {
        let (ids, parents, weights, labels) = build_tree(nodes);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| {
                let out = canopy::optimal(&ids, &parents, &weights, &labels, 20, 0.0)
                    .expect("planning succeeds");
                black_box(out.entropies);
            });
        });
    }
    group.finish();
}

fn benchmark_approximate(c: &mut Criterion) {
    let (ids, parents, weights, labels) = build_tree(2_000);
    let mut group = c.benchmark_group("approximate");
    for epsilon in [0.5, 0.1] {
        group.bench_with_input(
            BenchmarkId::from_parameter(epsilon),
            &epsilon,
            |b, &eps| {
                b.iter(|| {
                    let out = canopy::optimal(&ids, &parents, &weights, &labels, 20, eps)
                        .expect("planning succeeds");
                    black_box(out.entropies);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_greedy, benchmark_exact, benchmark_approximate);
criterion_main!(benches);
