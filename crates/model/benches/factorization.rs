//! Benchmarks for matrix building and factorization
//!
//! Run with: cargo bench --package model
//!
//! Uses a seeded synthetic dataset so runs are comparable without the real files.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::Transaction;
use model::{build_matrix, fit, DuplicatePolicy, Solver, SvdConfig, UserItemMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const USERS: u32 = 2_000;
const ATTRACTIONS: u32 = 30;
const VISITS_PER_USER: usize = 5;

fn synthetic_transactions() -> Vec<Transaction> {
    let mut rng = StdRng::seed_from_u64(7);
    (1..=USERS)
        .flat_map(|user| {
            (0..VISITS_PER_USER)
                .map(|_| {
                    let attraction = rng.random_range(1..=ATTRACTIONS);
                    let rating = rng.random_range(1..=5) as f64;
                    Transaction::new(user, attraction, rating)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn synthetic_matrix() -> UserItemMatrix {
    build_matrix(&synthetic_transactions(), DuplicatePolicy::Mean).expect("Failed to build matrix")
}

fn bench_build_matrix(c: &mut Criterion) {
    let transactions = synthetic_transactions();

    c.bench_function("build_matrix", |b| {
        b.iter(|| {
            let matrix = build_matrix(black_box(&transactions), DuplicatePolicy::Mean).unwrap();
            black_box(matrix)
        })
    });
}

fn bench_fit_randomized(c: &mut Criterion) {
    let matrix = synthetic_matrix();
    let config = SvdConfig::new(10);

    c.bench_function("fit_randomized_rank10", |b| {
        b.iter(|| black_box(fit(black_box(&matrix), &config).unwrap()))
    });
}

fn bench_fit_exact(c: &mut Criterion) {
    let matrix = synthetic_matrix();
    let config = SvdConfig::new(10).with_solver(Solver::Exact);

    c.bench_function("fit_exact_rank10", |b| {
        b.iter(|| black_box(fit(black_box(&matrix), &config).unwrap()))
    });
}

fn bench_reconstruct(c: &mut Criterion) {
    let factors = fit(&synthetic_matrix(), &SvdConfig::new(10)).unwrap();

    c.bench_function("reconstruct_dense", |b| {
        b.iter(|| black_box(factors.reconstruct()))
    });
}

criterion_group!(
    benches,
    bench_build_matrix,
    bench_fit_randomized,
    bench_fit_exact,
    bench_reconstruct
);
criterion_main!(benches);
