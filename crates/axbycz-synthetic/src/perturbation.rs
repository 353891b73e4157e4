//! Multivariate Gaussian perturbations in se(3).

use axbycz_lie::SE3Tangent;
use rand::Rng;

use crate::error::SyntheticError;
use crate::random::standard_normal_6;

/// Pivots within this distance of zero are treated as a zero variance direction.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Gaussian distribution over `[omega; upsilon]` tangent vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    mean: [f64; 6],
    covariance: [[f64; 6]; 6],
    factor: [[f64; 6]; 6],
}

impl Perturbation {
    /// Create a perturbation from its mean and row-major covariance.
    ///
    /// # Errors
    ///
    /// Every entry must be finite and the covariance must be symmetric positive
    /// semi-definite.
    pub fn new(mean: [f64; 6], covariance: [[f64; 6]; 6]) -> Result<Self, SyntheticError> {
        if let Some(value) = mean.iter().copied().find(|v| !v.is_finite()) {
            return Err(SyntheticError::InvalidParameter {
                name: "mean",
                value,
            });
        }
        if let Some(value) = covariance.iter().flatten().copied().find(|v| !v.is_finite()) {
            return Err(SyntheticError::InvalidParameter {
                name: "covariance entry",
                value,
            });
        }
        for row in 0..6 {
            for col in 0..row {
                let (a, b) = (covariance[row][col], covariance[col][row]);
                if (a - b).abs() > PIVOT_TOLERANCE * a.abs().max(b.abs()).max(1.0) {
                    return Err(SyntheticError::NotSymmetric { row, col });
                }
            }
        }
        let factor = cholesky_6x6(&covariance)?;
        Ok(Self {
            mean,
            covariance,
            factor,
        })
    }

    /// Zero-mean perturbation with independent components of the given
    /// standard deviations, ordered `[omega; upsilon]`.
    pub fn diagonal(stds: [f64; 6]) -> Result<Self, SyntheticError> {
        let mut covariance = [[0.0; 6]; 6];
        for (i, s) in stds.iter().enumerate() {
            if !s.is_finite() || *s < 0.0 {
                return Err(SyntheticError::InvalidParameter {
                    name: "standard deviation",
                    value: *s,
                });
            }
            covariance[i][i] = s * s;
        }
        Self::new([0.0; 6], covariance)
    }

    /// Zero-mean perturbation with one standard deviation for the rotation and
    /// one for the translation components.
    pub fn isotropic(rotation_std: f64, translation_std: f64) -> Result<Self, SyntheticError> {
        let (r, t) = (rotation_std, translation_std);
        Self::diagonal([r, r, r, t, t, t])
    }

    /// Mean tangent vector.
    pub fn mean(&self) -> [f64; 6] {
        self.mean
    }

    /// Row-major covariance.
    pub fn covariance(&self) -> &[[f64; 6]; 6] {
        &self.covariance
    }

    /// Draw one tangent vector `mean + L·n` with `L·Lᵀ = Σ` and `n ~ N(0, I)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SE3Tangent {
        let n = standard_normal_6(rng);
        let mut v = self.mean;
        for (i, out) in v.iter_mut().enumerate() {
            *out += (0..=i).map(|k| self.factor[i][k] * n[k]).sum::<f64>();
        }
        SE3Tangent::from_array(v)
    }
}

/// Lower triangular `L` with `L·Lᵀ = a` for a symmetric positive
/// semi-definite `a`. Zero variance directions give zero columns.
fn cholesky_6x6(a: &[[f64; 6]; 6]) -> Result<[[f64; 6]; 6], SyntheticError> {
    let scale = (0..6).map(|i| a[i][i].abs()).fold(1.0, f64::max);
    let mut l = [[0.0; 6]; 6];

    for j in 0..6 {
        let pivot = a[j][j] - (0..j).map(|k| l[j][k] * l[j][k]).sum::<f64>();
        if pivot < -PIVOT_TOLERANCE * scale {
            return Err(SyntheticError::NotPositiveSemiDefinite { row: j, pivot });
        }
        if pivot <= PIVOT_TOLERANCE * scale {
            // column stays zero; the rows below must not depend on it
            for i in (j + 1)..6 {
                let rest = a[i][j] - (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
                if rest.abs() > PIVOT_TOLERANCE.sqrt() * scale {
                    return Err(SyntheticError::NotPositiveSemiDefinite { row: j, pivot });
                }
            }
            continue;
        }

        let ljj = pivot.sqrt();
        l[j][j] = ljj;
        for i in (j + 1)..6 {
            let dot = (0..j).map(|k| l[i][k] * l[j][k]).sum::<f64>();
            l[i][j] = (a[i][j] - dot) / ljj;
        }
    }

    Ok(l)
}
