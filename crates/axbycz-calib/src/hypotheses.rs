//! Closed-form candidates for `A·X = Y·B` from second-order statistics.
//!
//! If `Bᵢ = Y⁻¹·Aᵢ·X` then the tangent residuals of the two streams are related
//! by the adjoint of `X⁻¹`, so the rotational covariance blocks satisfy
//! `Σ_B = Rᵀ·Σ_A·R`. Aligning their eigenbases fixes `R` up to the sign
//! ambiguity of each eigenvector; [`SIGN_FLIPS`] and their negations enumerate
//! the eight possibilities. The translation follows from the cross-covariance
//! blocks:
//!
//! ```text
//! (Rᵀ Σ_A¹¹ R)⁻¹ (Σ_B¹² − Rᵀ Σ_A¹² R) = [Rᵀ t]×
//! ```

use axbycz_lie::{SE3F64, SO3F64};
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::CalibError;
use crate::stats::{mean_cov, ManifoldStats, MeanCovParams};

/// Eigenvalues below this fraction of the largest one are treated as zero when
/// inverting the rotational covariance block.
const PINV_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Sign matrices with determinant +1 relating two sorted eigenbases.
///
/// Their negations complete the eight candidates of [`generate_hypotheses`].
pub const SIGN_FLIPS: [DMat3; 4] = [
    DMat3::IDENTITY,
    DMat3::from_diagonal(DVec3::new(-1.0, -1.0, 1.0)),
    DMat3::from_diagonal(DVec3::new(-1.0, 1.0, -1.0)),
    DMat3::from_diagonal(DVec3::new(1.0, -1.0, -1.0)),
];

/// Noise floor subtracted from both covariances before eigendecomposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseFloor {
    /// Scale of the identity removed from the covariance of the `A` stream.
    pub std_a: f64,
    /// Scale of the identity removed from the covariance of the `B` stream.
    pub std_b: f64,
    /// Whether to subtract at all.
    pub subtract: bool,
}

impl Default for NoiseFloor {
    fn default() -> Self {
        Self {
            std_a: 1e-4,
            std_b: 1e-4,
            subtract: false,
        }
    }
}

impl NoiseFloor {
    /// An enabled noise floor with the given per-stream values.
    pub fn new(std_a: f64, std_b: f64) -> Self {
        Self {
            std_a,
            std_b,
            subtract: true,
        }
    }
}

/// One `(X, Y)` candidate for `A·X = Y·B`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hypothesis {
    /// Candidate for `X`. Its rotation block may be a reflection.
    pub x: SE3F64,
    /// Companion `mean_A · x · mean_B⁻¹`.
    pub y: SE3F64,
    /// `det(x) > 0`.
    pub valid: bool,
}

/// Eigenvalues of the symmetric matrix `m` in ascending order, with the
/// matching unit eigenvectors as columns.
pub fn sorted_eigenbasis(m: &DMat3) -> (DVec3, DMat3) {
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| m.col(j)[i]);
    let eig = mat.selfadjoint_eigendecomposition(faer::Side::Lower);
    let u = eig.u();
    let s = eig.s().column_vector();

    let mut order: Vec<(f64, usize)> = (0..3).map(|i| (s.read(i), i)).collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0));

    let column = |k: usize| DVec3::new(u.read(0, k), u.read(1, k), u.read(2, k));
    let values = DVec3::new(order[0].0, order[1].0, order[2].0);
    let basis = DMat3::from_cols(column(order[0].1), column(order[1].1), column(order[2].1));
    (values, basis)
}

/// Inverse of a symmetric matrix from its eigendecomposition, zeroing the
/// eigenvalues that are negligible relative to the largest one.
fn pseudo_inverse(values: DVec3, basis: &DMat3, label: &str) -> DMat3 {
    let largest = values.abs().max_element();
    let threshold = largest * PINV_RELATIVE_TOLERANCE;

    let inv = values.to_array().map(|v| {
        if largest > 0.0 && v.abs() > threshold {
            1.0 / v
        } else {
            0.0
        }
    });
    if inv.iter().any(|v| *v == 0.0) {
        log::warn!(
            "rotational covariance of {label} is singular (eigenvalues {values:?}), \
             using a pseudo-inverse"
        );
    }

    *basis * DMat3::from_diagonal(DVec3::from_array(inv)) * basis.transpose()
}

/// Enumerate the eight `(X, Y)` candidates relating two summarized streams.
///
/// Candidate `k` uses `SIGN_FLIPS[k]` for `k < 4` and its negation otherwise.
/// Degenerate or indefinite covariance blocks are logged, never rejected; the
/// caller filters on [`Hypothesis::valid`].
pub fn generate_hypotheses(
    stats_a: &ManifoldStats,
    stats_b: &ManifoldStats,
    noise_floor: &NoiseFloor,
) -> [Hypothesis; 8] {
    let (sig_a, sig_b) = if noise_floor.subtract {
        (
            stats_a.covariance.sub_scaled_identity(noise_floor.std_a),
            stats_b.covariance.sub_scaled_identity(noise_floor.std_b),
        )
    } else {
        (stats_a.covariance, stats_b.covariance)
    };

    let (values_a, basis_a) = sorted_eigenbasis(&sig_a.rotation_block());
    let (values_b, basis_b) = sorted_eigenbasis(&sig_b.rotation_block());
    for (label, values) in [("A", values_a), ("B", values_b)] {
        if values.min_element() < 0.0 {
            log::warn!("rotational covariance of {label} is indefinite: eigenvalues {values:?}");
        }
    }

    // (Rᵀ Σ R)⁻¹ = Rᵀ Σ⁻¹ R for orthogonal R
    let s11_a_inv = pseudo_inverse(values_a, &basis_a, "A");
    let s12_a = sig_a.cross_block();
    let s12_b = sig_b.cross_block();
    let mean_b_inv = stats_b.mean.inverse();

    std::array::from_fn(|k| {
        let flip = if k < 4 {
            SIGN_FLIPS[k]
        } else {
            SIGN_FLIPS[k - 4] * -1.0
        };
        let r = basis_a * flip * basis_b.transpose();
        let rt = r.transpose();

        let temp = rt * s11_a_inv * r * (s12_b - rt * s12_a * r);
        // noisy statistics leave a symmetric part; keep the skew projection
        let t = r * SO3F64::vee((temp - temp.transpose()) * 0.5);

        let x = SE3F64::from_rt(&r, t);
        Hypothesis {
            x,
            y: stats_a.mean * x * mean_b_inv,
            valid: x.determinant() > 0.0,
        }
    })
}

/// Parameters of [`batch_solve_xy`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchSolveParams {
    /// Mean iteration parameters used for both streams.
    pub mean_cov: MeanCovParams,
    /// Optional noise floor correction.
    pub noise_floor: NoiseFloor,
}

impl BatchSolveParams {
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
}

/// All candidates of one `A·X = Y·B` solve together with the statistics they
/// were derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSolution {
    /// The eight candidates, valid or not.
    pub hypotheses: [Hypothesis; 8],
    /// Statistics of the `A` stream.
    pub stats_a: ManifoldStats,
    /// Statistics of the `B` stream.
    pub stats_b: ManifoldStats,
}

impl BatchSolution {
    /// Number of candidates with a proper rotation.
    pub fn num_valid(&self) -> usize {
        self.hypotheses.iter().filter(|h| h.valid).count()
    }

    /// `X` of every valid candidate, in enumeration order.
    pub fn valid_x(&self) -> Vec<SE3F64> {
        self.hypotheses
            .iter()
            .filter(|h| h.valid)
            .map(|h| h.x)
            .collect()
    }

    /// `Y` of every valid candidate, in enumeration order.
    pub fn valid_y(&self) -> Vec<SE3F64> {
        self.hypotheses
            .iter()
            .filter(|h| h.valid)
            .map(|h| h.y)
            .collect()
    }
}

/// Solve `A·X = Y·B` from the statistics of the two streams.
///
/// The streams need not have the same length, only the same underlying
/// relation.
///
/// # Errors
///
/// [`CalibError::EmptySampleSet`] if either stream is empty.
pub fn batch_solve_xy(
    a: &[SE3F64],
    b: &[SE3F64],
    params: &BatchSolveParams,
) -> Result<BatchSolution, CalibError> {
    CalibError::check_non_empty("A", a)?;
    CalibError::check_non_empty("B", b)?;

    let stats_a = mean_cov(a, &params.mean_cov)?;
    let stats_b = mean_cov(b, &params.mean_cov)?;
    let hypotheses = generate_hypotheses(&stats_a, &stats_b, &params.noise_floor);

    let solution = BatchSolution {
        hypotheses,
        stats_a,
        stats_b,
    };
    log::debug!(
        "batch_solve_xy: {} of 8 candidates valid ({} / {} samples)",
        solution.num_valid(),
        a.len(),
        b.len()
    );
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{rotation_error, translation_error};
    use approx::assert_relative_eq;
    use axbycz_lie::SE3Tangent;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pose(v: [f64; 6]) -> SE3F64 {
        SE3F64::exp(&SE3Tangent::from_array(v))
    }

    fn anisotropic_cloud(center: &SE3F64, n: usize, seed: u64) -> Vec<SE3F64> {
        let stds = [0.5, 0.3, 0.15, 0.4, 0.25, 0.1];
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let v = stds.map(|s| s * rng.random_range(-1.0..1.0));
                *center * pose(v)
            })
            .collect()
    }

    fn tight_params() -> BatchSolveParams {
        BatchSolveParams::default().with_mean_cov(MeanCovParams::default().with_tolerance(1e-12))
    }

    #[test]
    fn test_sign_flips() {
        for q in SIGN_FLIPS {
            assert_eq!(q.determinant(), 1.0);
            assert_eq!(q * q, DMat3::IDENTITY);
            assert_eq!((q * -1.0).determinant(), -1.0);
        }
    }

    #[test]
    fn test_sorted_eigenbasis() {
        let basis = pose([0.3, -0.4, 1.1, 0.0, 0.0, 0.0]).rotation.matrix();
        let m = basis * DMat3::from_diagonal(DVec3::new(3.0, 0.5, 2.0)) * basis.transpose();

        let (values, vectors) = sorted_eigenbasis(&m);
        assert_relative_eq!(values.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(values.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(values.z, 3.0, epsilon = 1e-12);

        let reconstructed = vectors * DMat3::from_diagonal(values) * vectors.transpose();
        assert!(reconstructed.abs_diff_eq(m, 1e-12));
        assert!((vectors.transpose() * vectors).abs_diff_eq(DMat3::IDENTITY, 1e-12));
    }

    #[test]
    fn test_noise_free_recovery() -> Result<(), Box<dyn std::error::Error>> {
        let x = pose([0.4, -1.2, 0.7, 0.3, 0.5, -0.8]);
        let y = pose([-0.9, 0.2, 0.5, 1.5, -0.4, 0.2]);
        let a = anisotropic_cloud(&pose([0.1, 0.2, 0.3, 1.0, 1.0, 1.0]), 40, 7);
        let b: Vec<_> = a.iter().map(|ai| y.inverse() * *ai * x).collect();

        let solution = batch_solve_xy(&a, &b, &tight_params())?;
        assert_eq!(solution.num_valid(), 4);

        let best = solution
            .valid_x()
            .into_iter()
            .zip(solution.valid_y())
            .find(|(cx, _)| rotation_error(cx, &x) < 1e-6)
            .ok_or("ground truth not among the candidates")?;
        assert!(translation_error(&best.0, &x) < 1e-6);
        assert!(rotation_error(&best.1, &y) < 1e-6);
        assert!(translation_error(&best.1, &y) < 1e-6);
        Ok(())
    }

    #[test]
    fn test_every_valid_candidate_is_proper() -> Result<(), Box<dyn std::error::Error>> {
        let a = anisotropic_cloud(&SE3F64::IDENTITY, 30, 3);
        let b = anisotropic_cloud(&pose([0.0, 0.0, 1.0, 0.0, 2.0, 0.0]), 25, 4);
        let solution = batch_solve_xy(&a, &b, &BatchSolveParams::default())?;

        assert_eq!(solution.num_valid() % 2, 0);
        for h in solution.hypotheses {
            assert_eq!(h.valid, h.x.determinant() > 0.0);
            if h.valid {
                assert!(h.x.is_valid(1e-9));
            }
        }
        Ok(())
    }

    #[test]
    fn test_noise_floor_subtraction_is_tolerated() -> Result<(), Box<dyn std::error::Error>> {
        let a = anisotropic_cloud(&SE3F64::IDENTITY, 20, 11);
        let params = BatchSolveParams::default().with_noise_floor(NoiseFloor::new(10.0, 10.0));
        let solution = batch_solve_xy(&a, &a, &params)?;
        assert_eq!(solution.hypotheses.len(), 8);
        assert!(solution
            .hypotheses
            .iter()
            .all(|h| h.x.matrix().is_finite() && h.y.matrix().is_finite()));
        Ok(())
    }

    #[test]
    fn test_singular_covariance() -> Result<(), Box<dyn std::error::Error>> {
        // pure translations: the rotational block is identically zero
        let a: Vec<_> = (0..5)
            .map(|i| pose([0.0, 0.0, 0.0, i as f64, 0.5 * i as f64, 1.0]))
            .collect();
        let solution = batch_solve_xy(&a, &a, &BatchSolveParams::default())?;
        assert!(solution
            .hypotheses
            .iter()
            .all(|h| h.x.matrix().is_finite()));
        Ok(())
    }

    #[test]
    fn test_empty_stream() {
        let a = vec![SE3F64::IDENTITY; 3];
        assert_eq!(
            batch_solve_xy(&a, &[], &BatchSolveParams::default()),
            Err(CalibError::EmptySampleSet { name: "B" })
        );
    }
}
