#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use trafikk_core::prelude::*;

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_throughput");
    let rules = Rules::new(5, 0.3).unwrap();

    for density in [0.1, 0.3, 0.6] {
        group.throughput(criterion::Throughput::Elements(1_000));
        group.bench_function(format!("density_{}", density), |b| {
            let mut rng = SeededSource::new(42);
            let mut road = Road::initialize(1_000, density, &mut rng).unwrap();
            b.iter(|| {
                black_box(advance(&mut road, &rules, &mut rng).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
