//! Noise-free `A·X·B = Y·C·Z` data streams.

use axbycz_lie::SE3F64;
use rand::Rng;

use crate::error::SyntheticError;
use crate::perturbation::Perturbation;
use crate::random::random_se3;

/// Which frame a generated stream holds constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedFrame {
    /// `A` fixed, `B` perturbed, `C` derived.
    A,
    /// `B` fixed, `A` perturbed, `C` derived.
    B,
    /// `C` fixed, `B` perturbed, `A` derived.
    C,
    /// Nothing fixed: `A` and `C` perturbed independently, `B` derived.
    Correspondence,
}

/// Three corresponding streams satisfying `Aᵢ·X·Bᵢ = Y·Cᵢ·Z`.
#[derive(Debug, Clone, PartialEq)]
pub struct AbcStreams {
    /// Samples of `A`.
    pub a: Vec<SE3F64>,
    /// Samples of `B`.
    pub b: Vec<SE3F64>,
    /// Samples of `C`.
    pub c: Vec<SE3F64>,
}

impl AbcStreams {
    /// Number of corresponding triples.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether the streams hold no samples.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// Generate `len` exact triples for the ground truth `(x, y, z)`.
///
/// Random base frames `A₀`, `B₀`, `C₀` are drawn first; perturbed frames are
/// `exp(ξ)·F₀` with `ξ` drawn from `perturbation`.
///
/// # Errors
///
/// [`SyntheticError::EmptyStream`] if `len == 0`.
pub fn generate_abc<R: Rng + ?Sized>(
    len: usize,
    fixed: FixedFrame,
    perturbation: &Perturbation,
    x: &SE3F64,
    y: &SE3F64,
    z: &SE3F64,
    rng: &mut R,
) -> Result<AbcStreams, SyntheticError> {
    if len == 0 {
        return Err(SyntheticError::EmptyStream);
    }

    let a0 = random_se3(rng);
    let b0 = random_se3(rng);
    let c0 = random_se3(rng);
    let (x_inv, y_inv, z_inv) = (x.inverse(), y.inverse(), z.inverse());

    let mut streams = AbcStreams {
        a: Vec::with_capacity(len),
        b: Vec::with_capacity(len),
        c: Vec::with_capacity(len),
    };

    for _ in 0..len {
        let (a, b, c) = match fixed {
            FixedFrame::A => {
                let b = SE3F64::exp(&perturbation.sample(rng)) * b0;
                (a0, b, y_inv * a0 * *x * b * z_inv)
            }
            FixedFrame::B => {
                let a = SE3F64::exp(&perturbation.sample(rng)) * a0;
                (a, b0, y_inv * a * *x * b0 * z_inv)
            }
            FixedFrame::C => {
                let b = (SE3F64::exp(&perturbation.sample(rng)) * b0).inverse();
                (*y * c0 * *z * b.inverse() * x_inv, b, c0)
            }
            FixedFrame::Correspondence => {
                let a = SE3F64::exp(&perturbation.sample(rng)) * a0;
                let c = SE3F64::exp(&perturbation.sample(rng)) * c0;
                (a, x_inv * a.inverse() * *y * c * *z, c)
            }
        };
        streams.a.push(a);
        streams.b.push(b);
        streams.c.push(c);
    }

    log::debug!("generated {len} triples with {fixed:?} fixed");
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn loop_error(s: &AbcStreams, x: &SE3F64, y: &SE3F64, z: &SE3F64) -> f64 {
        (0..s.len())
            .map(|i| {
                let lhs = (s.a[i] * *x * s.b[i]).matrix();
                let rhs = (*y * s.c[i] * *z).matrix();
                (lhs - rhs).to_cols_array().iter().fold(0.0f64, |m, v| m.max(v.abs()))
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_loop_closure_all_modes() -> Result<(), SyntheticError> {
        let mut rng = StdRng::seed_from_u64(21);
        let (x, y, z) = (
            random_se3(&mut rng),
            random_se3(&mut rng),
            random_se3(&mut rng),
        );
        let perturbation = Perturbation::isotropic(0.3, 0.5)?;

        for fixed in [
            FixedFrame::A,
            FixedFrame::B,
            FixedFrame::C,
            FixedFrame::Correspondence,
        ] {
            let s = generate_abc(20, fixed, &perturbation, &x, &y, &z, &mut rng)?;
            assert_eq!(s.len(), 20);
            assert_eq!(s.b.len(), 20);
            assert_eq!(s.c.len(), 20);
            assert!(loop_error(&s, &x, &y, &z) < 1e-10, "{fixed:?}");
        }
        Ok(())
    }

    #[test]
    fn test_fixed_frame_is_constant() -> Result<(), SyntheticError> {
        let mut rng = StdRng::seed_from_u64(2);
        let id = SE3F64::IDENTITY;
        let perturbation = Perturbation::isotropic(0.2, 0.2)?;

        let s = generate_abc(5, FixedFrame::A, &perturbation, &id, &id, &id, &mut rng)?;
        assert!(s.a.iter().all(|a| *a == s.a[0]));
        assert!(s.b.iter().any(|b| *b != s.b[0]));

        let s = generate_abc(5, FixedFrame::B, &perturbation, &id, &id, &id, &mut rng)?;
        assert!(s.b.iter().all(|b| *b == s.b[0]));

        let s = generate_abc(5, FixedFrame::C, &perturbation, &id, &id, &id, &mut rng)?;
        assert!(s.c.iter().all(|c| *c == s.c[0]));
        assert_relative_eq!(s.a[3].determinant(), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_empty_stream() -> Result<(), SyntheticError> {
        let mut rng = StdRng::seed_from_u64(0);
        let id = SE3F64::IDENTITY;
        let perturbation = Perturbation::isotropic(0.1, 0.1)?;
        assert_eq!(
            generate_abc(0, FixedFrame::A, &perturbation, &id, &id, &id, &mut rng),
            Err(SyntheticError::EmptyStream)
        );
        Ok(())
    }
}
