#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! All randomness goes through a caller-supplied [`rand::Rng`], so a seeded
//! generator reproduces a dataset exactly.
//!
//! ```rust
//! use axbycz_synthetic::{generate_abc, random_se3, FixedFrame, Perturbation};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let (x, y, z) = (random_se3(&mut rng), random_se3(&mut rng), random_se3(&mut rng));
//! let perturbation = Perturbation::isotropic(0.2, 0.3).unwrap();
//! let streams = generate_abc(10, FixedFrame::A, &perturbation, &x, &y, &z, &mut rng).unwrap();
//! assert_eq!(streams.len(), 10);
//! ```

mod error;

/// Streams of exact triples for the four fixing modes.
pub mod generate;

/// Measurement noise and correspondence scrambling.
pub mod noise;

/// Gaussian perturbations of the tangent space.
pub mod perturbation;

/// Random scalars and transforms.
pub mod random;

pub use error::SyntheticError;
pub use generate::{generate_abc, AbcStreams, FixedFrame};
pub use noise::{scramble_data, sensor_noise};
pub use perturbation::Perturbation;
pub use random::{random_se3, standard_normal};
