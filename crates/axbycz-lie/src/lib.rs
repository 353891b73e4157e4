#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Lie groups for rigid-body calibration
//!
//! This crate provides the two groups the calibration engine works on:
//!
//! - **SO(3)**: 3D rotations, stored as a 3×3 matrix
//! - **SE(3)**: 3D rigid body transformations (rotation + translation)
//!
//! together with the 6-dimensional tangent vector [`SE3Tangent`] of se(3),
//! ordered `[omega; upsilon]` (rotation generator first).
//!
//! Everything is double precision. Rotations are kept as matrices rather than
//! quaternions because candidate generation can produce reflections, and those
//! must stay observable through [`SO3F64::determinant`].
//!
//! ## Example
//!
//! ```rust
//! use axbycz_lie::{SE3F64, SE3Tangent};
//! use glam::DVec3;
//!
//! let twist = SE3Tangent::new(DVec3::new(0.0, 0.0, 0.3), DVec3::new(1.0, 0.0, 0.0));
//! let pose = SE3F64::exp(&twist);
//! let back = pose.log();
//! assert!((back - twist).norm() < 1e-12);
//! ```

/// Special Euclidean group SE(3) for 3D rigid transformations.
pub mod se3;

/// Special Orthogonal group SO(3) for 3D rotations.
pub mod so3;

pub use se3::{SE3Tangent, SE3F64};
pub use so3::SO3F64;
