//! # SO(3) — The Special Orthogonal Group in 3D
//!
//! SO(3) is the group of 3D rotations: 3×3 orthogonal matrices with determinant +1.
//!
//! ## Internal representation: rotation matrices
//!
//! [`SO3F64`] stores the 3×3 matrix directly. The calibration engine builds
//! rotation candidates as products of eigenvector bases and sign matrices, and
//! half of those are reflections (determinant −1). Keeping the raw matrix lets
//! [`SO3F64::determinant`] expose them so they can be filtered, which a
//! quaternion representation would silently hide.
//!
//! ## The exp/log maps
//!
//! The Lie algebra **so(3)** is the space of 3×3 skew-symmetric matrices, isomorphic
//! to R³ via the hat operator. A vector `v ∈ R³` is an axis-angle rotation: the
//! direction is the rotation axis, the magnitude is the angle in radians.
//!
//! `log` has two numerically delicate regions:
//!
//! - θ → 0: `sin θ / θ → 1`, handled with a Taylor expansion.
//! - θ → π: `sin θ → 0` so the skew part carries no usable axis information;
//!   the axis is read from the symmetric part `(R + Rᵀ)/2 = cos θ·I + (1 − cos θ)·aaᵀ`
//!   and its sign is aligned with whatever skew part remains.

use glam::{DMat3, DVec3};

const SMALL_ANGLE_EPSILON: f64 = 1.0e-8;
const NEAR_PI_EPSILON: f64 = 1.0e-4;

/// A 3D rotation, stored as a 3×3 matrix.
///
/// Values produced by [`SO3F64::exp`] are proper rotations. Values built with
/// [`SO3F64::from_matrix`] are taken as-is and may be improper; check
/// [`SO3F64::determinant`] or [`SO3F64::is_rotation`] before trusting them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SO3F64 {
    r: DMat3,
}

impl SO3F64 {
    /// The identity rotation.
    pub const IDENTITY: Self = Self { r: DMat3::IDENTITY };

    /// Wrap a 3×3 matrix without any orthonormality check.
    #[inline]
    pub fn from_matrix(mat: &DMat3) -> Self {
        Self { r: *mat }
    }

    /// Rotation of `angle` radians about `axis`.
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        Self::exp(axis.normalize() * angle)
    }

    /// The underlying 3×3 matrix.
    #[inline]
    pub fn matrix(&self) -> DMat3 {
        self.r
    }

    /// Determinant of the underlying matrix: +1 for rotations, −1 for reflections.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.r.determinant()
    }

    /// Whether the matrix is orthonormal within `tol` and has positive determinant.
    pub fn is_rotation(&self, tol: f64) -> bool {
        let gram = self.r.transpose() * self.r;
        let off = (gram - DMat3::IDENTITY)
            .to_cols_array()
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        off < tol && self.determinant() > 0.0
    }

    /// Group inverse (the transpose).
    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            r: self.r.transpose(),
        }
    }

    /// Adjoint representation; for SO(3) this is the rotation matrix itself.
    #[inline]
    pub fn adjoint(&self) -> DMat3 {
        self.r
    }

    /// Right retraction `self · exp(tau)`.
    #[inline]
    pub fn rplus(&self, tau: DVec3) -> Self {
        *self * SO3F64::exp(tau)
    }

    /// Right difference `log(self⁻¹ · other)`.
    #[inline]
    pub fn rminus(&self, other: &Self) -> DVec3 {
        (self.inverse() * *other).log()
    }

    /// Lie algebra -> Lie group (Rodrigues' formula).
    pub fn exp(v: DVec3) -> Self {
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();
        let k = Self::hat(v);

        let (a, b) = if theta < SMALL_ANGLE_EPSILON {
            // taylor series of sin(x)/x and (1 - cos(x))/x^2 around 0
            (1.0 - theta_sq / 6.0, 0.5 - theta_sq / 24.0)
        } else {
            (theta.sin() / theta, (1.0 - theta.cos()) / theta_sq)
        };

        Self {
            r: DMat3::IDENTITY + k * a + (k * k) * b,
        }
    }

    /// Lie group -> Lie algebra.
    ///
    /// Returns the axis-angle vector with angle in `[0, π]`. At exactly θ = π
    /// both `±π·axis` describe the same rotation; either may be returned.
    pub fn log(&self) -> DVec3 {
        let r = self.r;
        let skew = Self::vee(r - r.transpose());
        let cos_theta = 0.5 * (r.x_axis.x + r.y_axis.y + r.z_axis.z - 1.0);
        let sin_theta = 0.5 * skew.length();
        let theta = sin_theta.atan2(cos_theta.clamp(-1.0, 1.0));

        if theta < SMALL_ANGLE_EPSILON {
            return skew * (0.5 * (1.0 + theta * theta / 6.0));
        }

        if std::f64::consts::PI - theta < NEAR_PI_EPSILON {
            let axis = axis_from_symmetric_part(&r, cos_theta);
            let axis = if axis.dot(skew) < 0.0 { -axis } else { axis };
            return axis * theta;
        }

        skew * (0.5 * theta / sin_theta)
    }

    /// Vector space -> Lie algebra
    pub fn hat(v: DVec3) -> DMat3 {
        DMat3::from_cols(
            DVec3::new(0.0, v.z, -v.y),
            DVec3::new(-v.z, 0.0, v.x),
            DVec3::new(v.y, -v.x, 0.0),
        )
    }

    /// Lie algebra -> vector space
    ///
    /// PRECONDITION: `omega` is skew-symmetric. Passing anything else is a bug
    /// in the caller; project with `(m - mᵀ)/2` first when the input is only
    /// approximately skew.
    pub fn vee(omega: DMat3) -> DVec3 {
        debug_assert!(
            is_skew_symmetric(&omega),
            "vee called on a non skew-symmetric matrix: {omega:?}"
        );
        DVec3::new(omega.y_axis.z, omega.z_axis.x, omega.x_axis.y)
    }

    /// Left Jacobian of the exponential map, the `V` matrix of the SE(3) exponential.
    pub fn left_jacobian(v: DVec3) -> DMat3 {
        let k = Self::hat(v);
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();

        let (a, b) = if theta < SMALL_ANGLE_EPSILON {
            (0.5 - theta_sq / 24.0, 1.0 / 6.0 - theta_sq / 120.0)
        } else {
            (
                (1.0 - theta.cos()) / theta_sq,
                (theta - theta.sin()) / (theta_sq * theta),
            )
        };

        DMat3::IDENTITY + k * a + (k * k) * b
    }

    /// Inverse of [`SO3F64::left_jacobian`].
    pub fn left_jacobian_inv(v: DVec3) -> DMat3 {
        let k = Self::hat(v);
        let theta_sq = v.dot(v);
        let theta = theta_sq.sqrt();

        let c = if theta < SMALL_ANGLE_EPSILON {
            1.0 / 12.0 + theta_sq / 720.0
        } else {
            let half = 0.5 * theta;
            (1.0 - half * half.cos() / half.sin()) / theta_sq
        };

        DMat3::IDENTITY - k * 0.5 + (k * k) * c
    }
}

fn is_skew_symmetric(m: &DMat3) -> bool {
    let sym = (*m + m.transpose()).to_cols_array();
    let scale = m
        .to_cols_array()
        .iter()
        .fold(1.0f64, |acc, v| acc.max(v.abs()));
    sym.iter().all(|v| v.abs() <= 1e-9 * scale)
}

/// Unit rotation axis from `(R + Rᵀ)/2 = cos θ·I + (1 − cos θ)·aaᵀ`, using the
/// column with the largest diagonal entry. The sign is arbitrary.
fn axis_from_symmetric_part(r: &DMat3, cos_theta: f64) -> DVec3 {
    let s = (*r + r.transpose()) * 0.5;
    let diag = [s.x_axis.x, s.y_axis.y, s.z_axis.z];
    let k = (0..3).fold(0, |best, i| if diag[i] > diag[best] { i } else { best });
    let col = s.col(k) - DVec3::AXES[k] * cos_theta;
    col.normalize()
}

impl std::ops::Mul<SO3F64> for SO3F64 {
    type Output = SO3F64;

    fn mul(self, rhs: Self) -> Self::Output {
        Self { r: self.r * rhs.r }
    }
}

impl std::ops::MulAssign<SO3F64> for SO3F64 {
    #[inline]
    fn mul_assign(&mut self, rhs: SO3F64) {
        *self = *self * rhs;
    }
}

impl std::ops::Mul<DVec3> for SO3F64 {
    type Output = DVec3;

    fn mul(self, rhs: DVec3) -> Self::Output {
        self.r * rhs
    }
}
