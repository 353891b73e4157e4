use argh::FromArgs;
use rand::rngs::StdRng;
use rand::SeedableRng;

use axbycz::{
    calib::{
        loop_residual, rotation_error, solve_prob1, translation_error, DataStream, SolverConfig,
    },
    lie::{SE3Tangent, SE3F64},
    synthetic::{generate_abc, random_se3, sensor_noise, FixedFrame, Perturbation},
};

/// Solve AXB = YCZ on synthetic data with A fixed in one stream and C in the other
#[derive(FromArgs)]
struct Args {
    /// number of samples per stream
    #[argh(option, short = 'n', default = "50")]
    num_samples: usize,

    /// standard deviation of the sensor noise applied to B
    #[argh(option, short = 's', default = "0.01")]
    noise_std: f64,

    /// random seed
    #[argh(option, default = "0")]
    seed: u64,

    /// subtract the noise floor from the covariances
    #[argh(switch)]
    noise_floor: bool,
}

fn report(name: &str, estimate: &SE3F64, truth: &SE3F64) {
    println!(
        "{name}: rotation error {:.2e} rad, translation error {:.2e}",
        rotation_error(estimate, truth),
        translation_error(estimate, truth)
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (x, y, z) = (
        random_se3(&mut rng),
        random_se3(&mut rng),
        random_se3(&mut rng),
    );

    let perturbation = Perturbation::diagonal([0.6, 0.45, 0.3, 0.5, 0.4, 0.3])?;
    let n = args.num_samples;
    let mut a_fixed = generate_abc(n, FixedFrame::A, &perturbation, &x, &y, &z, &mut rng)?;
    let mut c_fixed = generate_abc(n, FixedFrame::C, &perturbation, &x, &y, &z, &mut rng)?;
    a_fixed.b = sensor_noise(&a_fixed.b, &SE3Tangent::ZERO, args.noise_std, &mut rng)?;
    c_fixed.b = sensor_noise(&c_fixed.b, &SE3Tangent::ZERO, args.noise_std, &mut rng)?;
    log::info!(
        "generated {} samples per stream with noise {}",
        args.num_samples,
        args.noise_std
    );

    let mut config = SolverConfig::default();
    config.noise_floor.subtract = args.noise_floor;

    let first = DataStream::new(&a_fixed.a, &a_fixed.b, &a_fixed.c);
    let second = DataStream::new(&c_fixed.a, &c_fixed.b, &c_fixed.c);
    let solution = solve_prob1(&first, &second, &config)?;

    println!(
        "searched {:?} candidates, best cost {:.4e}",
        solution.num_candidates, solution.cost
    );
    if !solution.converged {
        log::warn!("some stream means did not converge, raise the iteration cap");
    }
    report("X", &solution.x, &x);
    report("Y", &solution.y, &y);
    report("Z", &solution.z, &z);

    let residual = loop_residual(
        &a_fixed.a,
        &a_fixed.b,
        &a_fixed.c,
        &solution.x,
        &solution.y,
        &solution.z,
    )?;
    println!("mean loop residual on the first stream: {residual:.4e}");

    Ok(())
}
