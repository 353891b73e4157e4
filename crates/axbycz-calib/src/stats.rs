//! Intrinsic mean and tangent-space covariance of SE(3) sample sets.

use axbycz_lie::{SE3Tangent, SE3F64};
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::CalibError;

/// Parameters of the Karcher mean iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanCovParams {
    /// Maximum number of refinement steps.
    pub max_iterations: usize,
    /// Stop once the norm of the averaged tangent residual drops below this value.
    pub tolerance: f64,
}

impl Default for MeanCovParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-5,
        }
    }
}

impl MeanCovParams {
    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Row-major 6×6 covariance over `[omega; upsilon]` tangent vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariance6(pub [[f64; 6]; 6]);

impl Default for Covariance6 {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Covariance6 {
    /// The zero matrix.
    pub const fn zeros() -> Self {
        Self([[0.0; 6]; 6])
    }

    /// Entry at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[row][col]
    }

    /// Rotation-rotation block, rows and columns `0..3`.
    pub fn rotation_block(&self) -> DMat3 {
        self.block(0, 0)
    }

    /// Rotation-translation block, rows `0..3` and columns `3..6`.
    pub fn cross_block(&self) -> DMat3 {
        self.block(0, 3)
    }

    /// Translation-translation block, rows and columns `3..6`.
    pub fn translation_block(&self) -> DMat3 {
        self.block(3, 3)
    }

    /// `self − scale · I₆`.
    pub fn sub_scaled_identity(&self, scale: f64) -> Self {
        let mut out = *self;
        for (i, row) in out.0.iter_mut().enumerate() {
            row[i] -= scale;
        }
        out
    }

    /// Whether `|Σᵢⱼ − Σⱼᵢ| <= tol` for every entry.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        (0..6).all(|i| (0..6).all(|j| (self.0[i][j] - self.0[j][i]).abs() <= tol))
    }

    fn add_outer(&mut self, xi: &SE3Tangent) {
        let v = xi.to_array();
        for (i, row) in self.0.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry += v[i] * v[j];
            }
        }
    }

    fn scale(&mut self, factor: f64) {
        self.0
            .iter_mut()
            .flat_map(|row| row.iter_mut())
            .for_each(|entry| *entry *= factor);
    }

    fn block(&self, r0: usize, c0: usize) -> DMat3 {
        let col = |j: usize| {
            DVec3::new(
                self.0[r0][c0 + j],
                self.0[r0 + 1][c0 + j],
                self.0[r0 + 2][c0 + j],
            )
        };
        DMat3::from_cols(col(0), col(1), col(2))
    }
}

/// Mean and covariance of one sample set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldStats {
    /// Intrinsic (Karcher) mean.
    pub mean: SE3F64,
    /// Population covariance of `log(mean⁻¹ · sampleᵢ)`.
    pub covariance: Covariance6,
    /// Refinement steps taken.
    pub iterations: usize,
    /// Whether the step norm dropped below the tolerance.
    pub converged: bool,
    /// Number of samples summarized.
    pub num_samples: usize,
}

fn mean_residual(mean: &SE3F64, samples: &[SE3F64]) -> SE3Tangent {
    let mean_inv = mean.inverse();
    let sum = samples
        .iter()
        .fold(SE3Tangent::ZERO, |acc, s| acc + (mean_inv * *s).log());
    sum * (1.0 / samples.len() as f64)
}

/// Compute the intrinsic mean and tangent covariance of `samples`.
///
/// The mean is seeded with `exp(mean(log(Xᵢ)))` and refined with
/// `M ← M · exp(mean(log(M⁻¹ · Xᵢ)))`. The covariance is the population
/// covariance (divided by `N`) of the residuals at the final mean.
///
/// Hitting the iteration cap is logged as a warning and the last estimate is
/// returned with `converged == false`.
///
/// # Errors
///
/// [`CalibError::EmptySampleSet`] if `samples` is empty.
pub fn mean_cov(samples: &[SE3F64], params: &MeanCovParams) -> Result<ManifoldStats, CalibError> {
    CalibError::check_non_empty("samples", samples)?;

    let n = samples.len() as f64;
    let seed = samples
        .iter()
        .fold(SE3Tangent::ZERO, |acc, s| acc + s.log())
        * (1.0 / n);
    let mut mean = SE3F64::exp(&seed);

    let mut iterations = 0;
    let mut converged = false;
    while iterations < params.max_iterations {
        iterations += 1;
        let step = mean_residual(&mean, samples);
        mean = mean.rplus(&step);

        let step_norm = step.norm();
        log::debug!("mean_cov iteration {iterations}: step norm {step_norm:e}");
        if step_norm < params.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        log::warn!(
            "mean_cov did not converge after {} iterations on {} samples",
            iterations,
            samples.len()
        );
    }

    let mean_inv = mean.inverse();
    let mut covariance = Covariance6::zeros();
    for s in samples {
        covariance.add_outer(&(mean_inv * *s).log());
    }
    covariance.scale(1.0 / n);

    Ok(ManifoldStats {
        mean,
        covariance,
        iterations,
        converged,
        num_samples: samples.len(),
    })
}
