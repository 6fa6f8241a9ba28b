use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use prime_core::{is_prime, next_prime, sieve_primes};
use sphere_oscillator::prediction::{Basic, Differential, Enhanced, PredictionStrategy};
use sphere_oscillator::{simulate, OscillatorModel, SimulationOptions};

fn bench_is_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_prime");

    for n in [1_009u64, 1_000_003, 1_000_000_007] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| is_prime(n));
        });
    }

    group.finish();
}

fn bench_sieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_primes");

    for limit in [10_000u64, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| sieve_primes(limit));
        });
    }

    group.finish();
}

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    group.sample_size(20);

    for p in [7u64, 101, 10_007, 1_000_003] {
        let model = OscillatorModel::for_prime(p).unwrap();
        let options = SimulationOptions::default();
        group.bench_with_input(BenchmarkId::from_parameter(p), &model, |b, m| {
            b.iter(|| simulate(m, &options).unwrap());
        });
    }

    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    group.sample_size(20);

    let strategies: Vec<Box<dyn PredictionStrategy>> = vec![
        Box::new(Basic),
        Box::new(Enhanced::default()),
        Box::new(Differential::default()),
    ];
    let p = next_prime(100_000);
    let model = OscillatorModel::for_prime(p).unwrap();

    for strategy in &strategies {
        group.bench_with_input(BenchmarkId::new(strategy.name(), p), &model, |b, m| {
            b.iter(|| strategy.predict(m).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_is_prime,
    bench_sieve,
    bench_simulate,
    bench_strategies,
);
criterion_main!(benches);
