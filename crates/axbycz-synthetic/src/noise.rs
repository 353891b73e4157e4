//! Measurement noise and correspondence corruption.

use axbycz_lie::{SE3Tangent, SE3F64};
use glam::DVec3;
use rand::Rng;

use crate::error::SyntheticError;
use crate::random::standard_normal;

fn normal_vec3<R: Rng + ?Sized>(rng: &mut R) -> DVec3 {
    DVec3::new(
        standard_normal(rng),
        standard_normal(rng),
        standard_normal(rng),
    )
}

/// Apply independent Gaussian sensor noise to every transform.
///
/// Each sample becomes
///
/// ```text
/// gᵢ · exp([0; std·n₁ + mean.upsilon]) · exp([std·n₂ + mean.omega; 0])
/// ```
///
/// with fresh `n₁, n₂ ~ N(0, I₃)`: a translation perturbation followed by a
/// rotation perturbation, both in the body frame.
///
/// # Errors
///
/// [`SyntheticError::InvalidParameter`] if `std` is negative or not finite.
pub fn sensor_noise<R: Rng + ?Sized>(
    g: &[SE3F64],
    mean: &SE3Tangent,
    std: f64,
    rng: &mut R,
) -> Result<Vec<SE3F64>, SyntheticError> {
    if !std.is_finite() || std < 0.0 {
        return Err(SyntheticError::InvalidParameter {
            name: "standard deviation",
            value: std,
        });
    }

    Ok(g.iter()
        .map(|gi| {
            let translation = SE3Tangent::new(DVec3::ZERO, normal_vec3(rng) * std + mean.upsilon);
            let rotation = SE3Tangent::new(normal_vec3(rng) * std + mean.omega, DVec3::ZERO);
            *gi * SE3F64::exp(&translation) * SE3F64::exp(&rotation)
        })
        .collect())
}

/// Partially permute `samples` to break correspondence with the other streams.
///
/// Walking the indices in order, each position is swapped with a uniformly
/// chosen one with probability `rate_percent / 100`.
///
/// # Errors
///
/// [`SyntheticError::InvalidParameter`] if `rate_percent` is outside `[0, 100]`.
pub fn scramble_data<T: Clone, R: Rng + ?Sized>(
    samples: &[T],
    rate_percent: f64,
    rng: &mut R,
) -> Result<Vec<T>, SyntheticError> {
    if !(0.0..=100.0).contains(&rate_percent) {
        return Err(SyntheticError::InvalidParameter {
            name: "scramble rate",
            value: rate_percent,
        });
    }

    let n = samples.len();
    let mut index: Vec<usize> = (0..n).collect();
    let mut swaps = 0;
    for i in 0..n {
        if rng.random::<f64>() < 0.01 * rate_percent {
            let j = rng.random_range(0..n);
            index.swap(i, j);
            swaps += 1;
        }
    }
    log::debug!("scramble_data: {swaps} swaps over {n} samples");

    Ok(index.into_iter().map(|i| samples[i].clone()).collect())
}
