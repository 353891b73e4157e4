//! # SE(3) — rigid body transformations in 3D
//!
//! SE(3) = SO(3) ⋉ R³. An element is a rotation plus a translation and acts on
//! points as `p ↦ R·p + t`; its homogeneous form is the 4×4 matrix
//!
//! ```text
//! | R t |
//! | 0 1 |
//! ```
//!
//! The tangent space se(3) is 6-dimensional. [`SE3Tangent`] orders it as
//! `[omega; upsilon]`: `omega` generates the rotation and `upsilon` the
//! translation, so `exp([omega; upsilon]) = (exp(omega), V(omega)·upsilon)` with
//! `V` the left Jacobian of SO(3).

use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::so3::SO3F64;

/// Tangent vector of SE(3), ordered `[omega; upsilon]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SE3Tangent {
    /// Rotation generator.
    pub omega: DVec3,
    /// Translation generator.
    pub upsilon: DVec3,
}

impl SE3Tangent {
    /// The zero tangent vector.
    pub const ZERO: Self = Self {
        omega: DVec3::ZERO,
        upsilon: DVec3::ZERO,
    };

    /// Create a tangent vector from its rotation and translation parts.
    #[inline]
    pub fn new(omega: DVec3, upsilon: DVec3) -> Self {
        Self { omega, upsilon }
    }

    /// Build from `[wx, wy, wz, vx, vy, vz]`.
    pub fn from_array(v: [f64; 6]) -> Self {
        Self {
            omega: DVec3::new(v[0], v[1], v[2]),
            upsilon: DVec3::new(v[3], v[4], v[5]),
        }
    }

    /// Flatten to `[wx, wy, wz, vx, vy, vz]`.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.omega.x,
            self.omega.y,
            self.omega.z,
            self.upsilon.x,
            self.upsilon.y,
            self.upsilon.z,
        ]
    }

    /// Euclidean norm of the 6-vector.
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.omega.length_squared() + self.upsilon.length_squared()).sqrt()
    }

    /// The 4×4 se(3) matrix `[hat(omega) upsilon; 0 0]`.
    pub fn hat(&self) -> DMat4 {
        let w = SO3F64::hat(self.omega);
        DMat4::from_cols(
            w.x_axis.extend(0.0),
            w.y_axis.extend(0.0),
            w.z_axis.extend(0.0),
            self.upsilon.extend(0.0),
        )
    }
}

impl std::ops::Add for SE3Tangent {
    type Output = SE3Tangent;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.omega + rhs.omega, self.upsilon + rhs.upsilon)
    }
}

impl std::ops::AddAssign for SE3Tangent {
    fn add_assign(&mut self, rhs: Self) {
        self.omega += rhs.omega;
        self.upsilon += rhs.upsilon;
    }
}

impl std::ops::Sub for SE3Tangent {
    type Output = SE3Tangent;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.omega - rhs.omega, self.upsilon - rhs.upsilon)
    }
}

impl std::ops::Neg for SE3Tangent {
    type Output = SE3Tangent;

    fn neg(self) -> Self::Output {
        Self::new(-self.omega, -self.upsilon)
    }
}

impl std::ops::Mul<f64> for SE3Tangent {
    type Output = SE3Tangent;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.omega * rhs, self.upsilon * rhs)
    }
}

/// A rigid body transformation in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3F64 {
    /// Rotation part.
    pub rotation: SO3F64,
    /// Translation part.
    pub translation: DVec3,
}

impl Default for SE3F64 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SE3F64 {
    /// Identity transformation.
    pub const IDENTITY: Self = Self {
        rotation: SO3F64::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create from a rotation and a translation.
    #[inline]
    pub fn new(rotation: SO3F64, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Create from a 3×3 matrix block and a translation, without validation.
    #[inline]
    pub fn from_rt(rotation: &DMat3, translation: DVec3) -> Self {
        Self::new(SO3F64::from_matrix(rotation), translation)
    }

    /// Create from a 4×4 homogeneous matrix. The bottom row is ignored.
    pub fn from_matrix(mat: &DMat4) -> Self {
        Self {
            rotation: SO3F64::from_matrix(&DMat3::from_mat4(*mat)),
            translation: mat.w_axis.truncate(),
        }
    }

    /// Convert to a 4×4 homogeneous matrix.
    pub fn matrix(&self) -> DMat4 {
        let r = self.rotation.matrix();
        DMat4::from_cols(
            r.x_axis.extend(0.0),
            r.y_axis.extend(0.0),
            r.z_axis.extend(0.0),
            DVec4::new(self.translation.x, self.translation.y, self.translation.z, 1.0),
        )
    }

    /// Determinant of the rotation block (equal to that of the homogeneous matrix).
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.rotation.determinant()
    }

    /// Whether the rotation block is a proper rotation within `tol`.
    #[inline]
    pub fn is_valid(&self, tol: f64) -> bool {
        self.rotation.is_rotation(tol) && self.translation.is_finite()
    }

    /// Inverse transformation.
    pub fn inverse(&self) -> Self {
        let inv_rot = self.rotation.inverse();
        let inv_trans = -(inv_rot * self.translation);
        Self {
            rotation: inv_rot,
            translation: inv_trans,
        }
    }

    /// Apply the transformation to a point.
    #[inline]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.rotation * p + self.translation
    }

    /// Exponential map from Lie algebra to group.
    pub fn exp(tangent: &SE3Tangent) -> Self {
        let rotation = SO3F64::exp(tangent.omega);
        let v = SO3F64::left_jacobian(tangent.omega);
        Self {
            rotation,
            translation: v * tangent.upsilon,
        }
    }

    /// Logarithmic map from group to Lie algebra.
    pub fn log(&self) -> SE3Tangent {
        let omega = self.rotation.log();
        let v_inv = SO3F64::left_jacobian_inv(omega);
        SE3Tangent {
            omega,
            upsilon: v_inv * self.translation,
        }
    }

    /// Right retraction `self · exp(tau)`.
    #[inline]
    pub fn rplus(&self, tau: &SE3Tangent) -> Self {
        *self * SE3F64::exp(tau)
    }

    /// Right difference `log(self⁻¹ · other)`.
    #[inline]
    pub fn rminus(&self, other: &Self) -> SE3Tangent {
        (self.inverse() * *other).log()
    }

    /// Adjoint matrix acting on `[omega; upsilon]` tangents:
    ///
    /// ```text
    /// [   R     0 ]
    /// [ [t]×R   R ]
    /// ```
    ///
    /// so that `g · exp(ξ) · g⁻¹ = exp(Ad_g · ξ)`.
    pub fn adjoint(&self) -> [[f64; 6]; 6] {
        let r = self.rotation.matrix();
        let tr = SO3F64::hat(self.translation) * r;
        let mut adj = [[0.0; 6]; 6];
        for i in 0..3 {
            for j in 0..3 {
                adj[i][j] = r.col(j)[i];
                adj[i + 3][j] = tr.col(j)[i];
                adj[i + 3][j + 3] = r.col(j)[i];
            }
        }
        adj
    }

    /// Element-wise comparison of the homogeneous matrices.
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.matrix().abs_diff_eq(other.matrix(), max_abs_diff)
    }
}

impl std::ops::Mul<SE3F64> for SE3F64 {
    type Output = SE3F64;

    fn mul(self, rhs: SE3F64) -> Self::Output {
        Self {
            rotation: self.rotation * rhs.rotation,
            translation: self.translation + self.rotation * rhs.translation,
        }
    }
}

impl std::ops::MulAssign<SE3F64> for SE3F64 {
    #[inline]
    fn mul_assign(&mut self, rhs: SE3F64) {
        *self = *self * rhs;
    }
}

impl std::ops::Mul<DVec3> for SE3F64 {
    type Output = DVec3;

    fn mul(self, rhs: DVec3) -> Self::Output {
        self.transform_point(rhs)
    }
}
