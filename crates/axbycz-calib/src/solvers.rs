//! Probabilistic `A·X·B = Y·C·Z` solvers.
//!
//! Each data stream holds one frame fixed while the other two vary. A stream
//! with `A` fixed reduces to `Cᵢ·Z = (Y⁻¹·A·X)·Bᵢ`, one with `C` fixed to
//! `Aᵢ·X = (Y·C·Z)·Bᵢ⁻¹`, and one with `B` fixed to
//! `Cᵢ⁻¹·Y⁻¹ = (Z·B⁻¹·X⁻¹)·Aᵢ⁻¹`. Each reduction is solved with
//! [`batch_solve_xy`]; the remaining unknown comes from the mean equations and
//! the best combination is picked by [`select_best`].

use axbycz_lie::SE3F64;
use serde::{Deserialize, Serialize};

use crate::error::CalibError;
use crate::hypotheses::{batch_solve_xy, BatchSolveParams, NoiseFloor};
use crate::selection::{derive_y_candidates, select_best, MeanEquation};
use crate::stats::{ManifoldStats, MeanCovParams};

/// Corresponding `A`, `B`, `C` observations of one experiment.
#[derive(Debug, Clone, Copy)]
pub struct DataStream<'a> {
    /// Observations of `A`.
    pub a: &'a [SE3F64],
    /// Observations of `B`.
    pub b: &'a [SE3F64],
    /// Observations of `C`.
    pub c: &'a [SE3F64],
}

impl<'a> DataStream<'a> {
    /// Create a new stream.
    pub fn new(a: &'a [SE3F64], b: &'a [SE3F64], c: &'a [SE3F64]) -> Self {
        Self { a, b, c }
    }

    /// Check that the stream is non-empty and that `A`, `B` and `C` have the
    /// same length.
    pub fn validate(&self) -> Result<(), CalibError> {
        CalibError::check_lengths("A", self.a, "B", self.b)?;
        CalibError::check_lengths("A", self.a, "C", self.c)?;
        CalibError::check_non_empty("A", self.a)?;
        Ok(())
    }

    /// Number of corresponding triples.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether the stream holds no samples.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

fn first(samples: &[SE3F64], name: &'static str) -> Result<SE3F64, CalibError> {
    samples
        .first()
        .copied()
        .ok_or(CalibError::EmptySampleSet { name })
}

fn inverted(samples: &[SE3F64]) -> Vec<SE3F64> {
    samples.iter().map(SE3F64::inverse).collect()
}

fn all_converged<'a>(stats: impl IntoIterator<Item = &'a ManifoldStats>) -> bool {
    stats.into_iter().all(|s| s.converged)
}

/// Configuration shared by the solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Mean iteration parameters for every stream.
    pub mean_cov: MeanCovParams,
    /// Noise floor applied in every batch solve.
    pub noise_floor: NoiseFloor,
    /// Weight of the translation error against the rotation error.
    pub translation_weight: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            mean_cov: MeanCovParams::default(),
            noise_floor: NoiseFloor::default(),
            translation_weight: 1.5,
        }
    }
}

impl SolverConfig {
    /// Defaults tuned for the three-stream problem.
    pub fn three_constraint() -> Self {
        Self {
            translation_weight: 1.8,
            ..Self::default()
        }
    }

    /// Set the mean iteration parameters.
    pub fn with_mean_cov(mut self, mean_cov: MeanCovParams) -> Self {
        self.mean_cov = mean_cov;
        self
    }

    /// Set the noise floor.
    pub fn with_noise_floor(mut self, noise_floor: NoiseFloor) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    /// Set the translation weight.
    pub fn with_translation_weight(mut self, translation_weight: f64) -> Self {
        self.translation_weight = translation_weight;
        self
    }

    fn batch_params(&self) -> BatchSolveParams {
        BatchSolveParams::default()
            .with_mean_cov(self.mean_cov)
            .with_noise_floor(self.noise_floor)
    }
}

/// Result of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Estimated `X`.
    pub x: SE3F64,
    /// Estimated `Y`.
    pub y: SE3F64,
    /// Estimated `Z`.
    pub z: SE3F64,
    /// Cost of the selected triple.
    pub cost: f64,
    /// Number of `(X, Y, Z)` candidates searched.
    pub num_candidates: (usize, usize, usize),
    /// Whether the mean iteration converged for every stream summarized.
    pub converged: bool,
}

/// Solve `A·X·B = Y·C·Z` from two streams.
///
/// * `a_fixed`: `A` held at its first sample, `B` and `C` varying.
/// * `c_fixed`: `C` held at its first sample, `A` and `B` varying.
///
/// `Z` comes from the first stream, `X` from the second, and `Y` from the two
/// mean equations applied to every `(X, Z)` pair.
///
/// # Errors
///
/// * [`CalibError::DimensionMismatch`] or [`CalibError::EmptySampleSet`] for
///   malformed streams, before any computation.
/// * [`CalibError::EmptyCandidateSet`] if no valid `X` or `Z` survives.
pub fn solve_prob1(
    a_fixed: &DataStream<'_>,
    c_fixed: &DataStream<'_>,
    config: &SolverConfig,
) -> Result<Solution, CalibError> {
    a_fixed.validate()?;
    c_fixed.validate()?;

    let params = config.batch_params();
    let a1 = first(a_fixed.a, "A1")?;
    let c2 = first(c_fixed.c, "C2")?;

    // Z: C1·Z = Y'·B1
    let z_solution = batch_solve_xy(a_fixed.c, a_fixed.b, &params)?;
    let zs = z_solution.valid_x();
    let mean_c1 = z_solution.stats_a.mean;
    let mean_b1 = z_solution.stats_b.mean;

    // X: A2·X = Y'·B2⁻¹
    let x_solution = batch_solve_xy(c_fixed.a, &inverted(c_fixed.b), &params)?;
    let xs = x_solution.valid_x();
    let mean_a2 = x_solution.stats_a.mean;
    // the mean commutes with inversion
    let mean_b2 = x_solution.stats_b.mean.inverse();

    log::debug!(
        "solve_prob1: {} X and {} Z candidates",
        xs.len(),
        zs.len()
    );

    let equations = [
        MeanEquation::new(a1, mean_b1, mean_c1),
        MeanEquation::new(mean_a2, mean_b2, c2),
    ];
    let ys = derive_y_candidates(&xs, &zs, &equations)?;
    let best = select_best(&xs, &ys, &zs, &equations, config.translation_weight)?;

    Ok(Solution {
        x: best.x,
        y: best.y,
        z: best.z,
        cost: best.cost,
        num_candidates: (xs.len(), ys.len(), zs.len()),
        converged: all_converged([
            &z_solution.stats_a,
            &z_solution.stats_b,
            &x_solution.stats_a,
            &x_solution.stats_b,
        ]),
    })
}

/// Solve `A·X·B = Y·C·Z` from three streams.
///
/// * `a_fixed`: `A` held at its first sample, gives `Z`.
/// * `c_fixed`: `C` held at its first sample, gives `X`.
/// * `b_fixed`: `B` held at its first sample, gives `Y`.
///
/// The triple is selected over the three mean equations.
///
/// # Errors
///
/// As for [`solve_prob1`], plus [`CalibError::EmptyCandidateSet`] for `Y`.
pub fn solve_prob2(
    a_fixed: &DataStream<'_>,
    c_fixed: &DataStream<'_>,
    b_fixed: &DataStream<'_>,
    config: &SolverConfig,
) -> Result<Solution, CalibError> {
    a_fixed.validate()?;
    c_fixed.validate()?;
    b_fixed.validate()?;

    let params = config.batch_params();
    let a1 = first(a_fixed.a, "A1")?;
    let c2 = first(c_fixed.c, "C2")?;
    let b3 = first(b_fixed.b, "B3")?;

    let z_solution = batch_solve_xy(a_fixed.c, a_fixed.b, &params)?;
    let zs = z_solution.valid_x();

    let x_solution = batch_solve_xy(c_fixed.a, &inverted(c_fixed.b), &params)?;
    let xs = x_solution.valid_x();
    let mean_b2 = x_solution.stats_b.mean.inverse();

    // Y⁻¹: C3⁻¹·Y⁻¹ = Y'·A3⁻¹
    let y_solution = batch_solve_xy(&inverted(b_fixed.c), &inverted(b_fixed.a), &params)?;
    let ys: Vec<SE3F64> = y_solution.valid_x().iter().map(SE3F64::inverse).collect();
    let mean_a3 = y_solution.stats_b.mean.inverse();
    let mean_c3 = y_solution.stats_a.mean.inverse();

    log::debug!(
        "solve_prob2: {} X, {} Y and {} Z candidates",
        xs.len(),
        ys.len(),
        zs.len()
    );

    let equations = [
        MeanEquation::new(a1, z_solution.stats_b.mean, z_solution.stats_a.mean),
        MeanEquation::new(x_solution.stats_a.mean, mean_b2, c2),
        MeanEquation::new(mean_a3, b3, mean_c3),
    ];
    let best = select_best(&xs, &ys, &zs, &equations, config.translation_weight)?;

    Ok(Solution {
        x: best.x,
        y: best.y,
        z: best.z,
        cost: best.cost,
        num_candidates: (xs.len(), ys.len(), zs.len()),
        converged: all_converged([
            &z_solution.stats_a,
            &z_solution.stats_b,
            &x_solution.stats_a,
            &x_solution.stats_b,
            &y_solution.stats_a,
            &y_solution.stats_b,
        ]),
    })
}
