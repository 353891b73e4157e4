use axbycz_calib::{
    batch_solve_xy, mean_cov, solve_prob1, BatchSolveParams, DataStream, MeanCovParams,
    SolverConfig,
};
use axbycz_lie::SE3Tangent;
use axbycz_synthetic::{generate_abc, random_se3, sensor_noise, FixedFrame, Perturbation};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("solvers");

    for num_samples in [20, 100, 500] {
        let mut rng = StdRng::seed_from_u64(0);
        let (x, y, z) = (
            random_se3(&mut rng),
            random_se3(&mut rng),
            random_se3(&mut rng),
        );
        let perturbation =
            Perturbation::diagonal([0.6, 0.45, 0.3, 0.5, 0.4, 0.3]).expect("valid covariance");
        let mut a_fixed =
            generate_abc(num_samples, FixedFrame::A, &perturbation, &x, &y, &z, &mut rng)
                .expect("non-empty stream");
        let c_fixed = generate_abc(num_samples, FixedFrame::C, &perturbation, &x, &y, &z, &mut rng)
            .expect("non-empty stream");
        a_fixed.b = sensor_noise(&a_fixed.b, &SE3Tangent::ZERO, 0.01, &mut rng)
            .expect("valid noise level");

        group.bench_with_input(
            BenchmarkId::new("mean_cov", num_samples),
            &a_fixed.b,
            |b, samples| {
                b.iter(|| std::hint::black_box(mean_cov(samples, &MeanCovParams::default())))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("batch_solve_xy", num_samples),
            &(&a_fixed.c, &a_fixed.b),
            |b, (lhs, rhs)| {
                b.iter(|| {
                    std::hint::black_box(batch_solve_xy(lhs, rhs, &BatchSolveParams::default()))
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("solve_prob1", num_samples),
            &(&a_fixed, &c_fixed),
            |b, (first, second)| {
                let first = DataStream::new(&first.a, &first.b, &first.c);
                let second = DataStream::new(&second.a, &second.b, &second.c);
                b.iter(|| {
                    std::hint::black_box(solve_prob1(&first, &second, &SolverConfig::default()))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
