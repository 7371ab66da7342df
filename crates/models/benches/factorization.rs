//! Benchmark a single factorization fit on a synthetic rating matrix.

use criterion::{Criterion, criterion_group, criterion_main};
use models::{FactorConfig, FactorModel, RatingMatrix};
use std::hint::black_box;

fn synthetic_matrix(users: u32, movies: u32) -> RatingMatrix {
    let mut triples = Vec::new();
    for u in 0..users {
        for m in 0..movies {
            if (u + m) % 3 == 0 {
                continue;
            }
            let value = 1.0 + ((u % 5) as f32) * 0.5 + ((m % 4) as f32) * 0.4;
            triples.push((u + 1, m + 1, value));
        }
    }
    RatingMatrix::from_triples(triples)
}

fn bench_factorization_fit(c: &mut Criterion) {
    let train = synthetic_matrix(200, 300);
    let config = FactorConfig {
        rank: 10,
        gamma: 5.0,
        iterations: 5,
        seed: 42,
    };

    c.bench_function("als_fit_200x300_rank10", |b| {
        b.iter(|| {
            let model = FactorModel::fit(black_box(&train), config).unwrap();
            black_box(model);
        })
    });
}

criterion_group!(benches, bench_factorization_fit);
criterion_main!(benches);
