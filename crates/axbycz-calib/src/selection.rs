//! Assembly of `Y` candidates and exhaustive search over `(X, Y, Z)` triples.

use axbycz_lie::SE3F64;
use rayon::prelude::*;

use crate::error::CalibError;
use crate::metrics::{rotation_error, translation_error};

/// One loop closure `a·X·b = Y·c·Z` evaluated at fixed or mean frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanEquation {
    /// Left factor of the left-hand side.
    pub a: SE3F64,
    /// Right factor of the left-hand side.
    pub b: SE3F64,
    /// Middle factor of the right-hand side.
    pub c: SE3F64,
}

impl MeanEquation {
    /// Create a new equation.
    pub fn new(a: SE3F64, b: SE3F64, c: SE3F64) -> Self {
        Self { a, b, c }
    }

    /// `Y = a·X·b·Z⁻¹·c⁻¹`.
    pub fn solve_y(&self, x: &SE3F64, z: &SE3F64) -> SE3F64 {
        self.a * *x * self.b * z.inverse() * self.c.inverse()
    }

    /// `rotation_error + weight · translation_error` between `a·X·b` and `Y·c·Z`.
    pub fn residual(&self, x: &SE3F64, y: &SE3F64, z: &SE3F64, translation_weight: f64) -> f64 {
        let left = self.a * *x * self.b;
        let right = *y * self.c * *z;
        rotation_error(&left, &right) + translation_weight * translation_error(&left, &right)
    }
}

/// Derive `Y` from every `(X, Z)` pair through every equation.
///
/// The output is ordered equation-major, then by `X`, then by `Z`, and holds
/// `equations.len() · xs.len() · zs.len()` candidates.
///
/// # Errors
///
/// [`CalibError::EmptyCandidateSet`] if `xs` or `zs` is empty,
/// [`CalibError::NoEquations`] if `equations` is.
pub fn derive_y_candidates(
    xs: &[SE3F64],
    zs: &[SE3F64],
    equations: &[MeanEquation],
) -> Result<Vec<SE3F64>, CalibError> {
    check_candidates("X", xs)?;
    check_candidates("Z", zs)?;
    check_equations(equations)?;

    Ok(equations
        .iter()
        .flat_map(move |eq| {
            xs.iter()
                .flat_map(move |x| zs.iter().map(move |z| eq.solve_y(x, z)))
        })
        .collect())
}

/// Sum of [`MeanEquation::residual`] over `equations`.
pub fn score_combination(
    x: &SE3F64,
    y: &SE3F64,
    z: &SE3F64,
    equations: &[MeanEquation],
    translation_weight: f64,
) -> f64 {
    equations
        .iter()
        .map(|eq| eq.residual(x, y, z, translation_weight))
        .sum()
}

/// Dense cost grid over `X × Y × Z` candidate indices.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    /// `(nx, ny, nz)`.
    pub shape: (usize, usize, usize),
    /// Row-major costs, `z` varying fastest.
    pub costs: Vec<f64>,
}

impl CostTable {
    /// Flat index of `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        let (_, ny, nz) = self.shape;
        (i * ny + j) * nz + k
    }

    /// Cost of the triple `(xs[i], ys[j], zs[k])`.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        let (nx, ny, nz) = self.shape;
        if i >= nx || j >= ny || k >= nz {
            return None;
        }
        self.costs.get(self.index(i, j, k)).copied()
    }

    /// Position and value of the smallest cost.
    ///
    /// Ties resolve to the first entry in row-major order. NaN never wins over a
    /// number. `None` for an empty table.
    pub fn argmin(&self) -> Option<((usize, usize, usize), f64)> {
        let (_, ny, nz) = self.shape;
        let mut iter = self.costs.iter().copied().enumerate();
        let first = iter.next()?;
        let (idx, cost) = iter.fold(first, |best, (idx, cost)| {
            if cost < best.1 || (best.1.is_nan() && !cost.is_nan()) {
                (idx, cost)
            } else {
                best
            }
        });
        Some(((idx / (ny * nz), (idx / nz) % ny, idx % nz), cost))
    }
}

/// Score every `(X, Y, Z)` triple in parallel.
pub fn build_cost_table(
    xs: &[SE3F64],
    ys: &[SE3F64],
    zs: &[SE3F64],
    equations: &[MeanEquation],
    translation_weight: f64,
) -> CostTable {
    let shape = (xs.len(), ys.len(), zs.len());
    let (_, ny, nz) = shape;
    let costs = (0..xs.len() * ny * nz)
        .into_par_iter()
        .map(|idx| {
            let (i, j, k) = (idx / (ny * nz), (idx / nz) % ny, idx % nz);
            score_combination(&xs[i], &ys[j], &zs[k], equations, translation_weight)
        })
        .collect();
    CostTable { shape, costs }
}

/// The minimizing triple of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Selected `X`.
    pub x: SE3F64,
    /// Selected `Y`.
    pub y: SE3F64,
    /// Selected `Z`.
    pub z: SE3F64,
    /// Its cost.
    pub cost: f64,
    /// Its `(i, j, k)` position in the candidate sets.
    pub index: (usize, usize, usize),
}

/// Exhaustively search `xs × ys × zs` for the lowest [`score_combination`].
///
/// # Errors
///
/// * [`CalibError::EmptyCandidateSet`] if any of the sets is empty.
/// * [`CalibError::NoEquations`] if `equations` is empty, since every triple
///   would then score zero.
/// * [`CalibError::NonFiniteCost`] if no triple has a finite cost.
pub fn select_best(
    xs: &[SE3F64],
    ys: &[SE3F64],
    zs: &[SE3F64],
    equations: &[MeanEquation],
    translation_weight: f64,
) -> Result<Selection, CalibError> {
    check_candidates("X", xs)?;
    check_candidates("Y", ys)?;
    check_candidates("Z", zs)?;
    check_equations(equations)?;

    let table = build_cost_table(xs, ys, zs, equations, translation_weight);
    let ((i, j, k), cost) = table
        .argmin()
        .ok_or(CalibError::EmptyCandidateSet { unknown: "X" })?;
    if !cost.is_finite() {
        return Err(CalibError::NonFiniteCost);
    }
    log::debug!(
        "select_best: {} combinations, best ({i}, {j}, {k}) with cost {cost:e}",
        table.costs.len()
    );

    Ok(Selection {
        x: xs[i],
        y: ys[j],
        z: zs[k],
        cost,
        index: (i, j, k),
    })
}

fn check_equations(equations: &[MeanEquation]) -> Result<(), CalibError> {
    if equations.is_empty() {
        return Err(CalibError::NoEquations);
    }
    Ok(())
}

fn check_candidates(unknown: &'static str, set: &[SE3F64]) -> Result<(), CalibError> {
    if set.is_empty() {
        return Err(CalibError::EmptyCandidateSet { unknown });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use axbycz_lie::SE3Tangent;
    use glam::{DMat3, DVec3};

    fn pose(v: [f64; 6]) -> SE3F64 {
        SE3F64::exp(&SE3Tangent::from_array(v))
    }

    fn ground_truth() -> (SE3F64, SE3F64, SE3F64) {
        (
            pose([0.3, -0.2, 0.8, 0.1, 0.4, -0.3]),
            pose([-1.0, 0.5, 0.2, 1.2, 0.0, 0.7]),
            pose([0.6, 0.6, -0.4, -0.5, 0.9, 0.2]),
        )
    }

    fn consistent_equations(x: &SE3F64, y: &SE3F64, z: &SE3F64) -> Vec<MeanEquation> {
        [
            ([0.2, 0.1, 0.0, 1.0, 0.0, 0.0], [0.0, 0.5, 0.3, 0.0, 1.0, 1.0]),
            ([1.0, -0.4, 0.2, 0.0, 0.0, 2.0], [0.1, 0.1, 0.1, 0.5, 0.5, 0.5]),
        ]
        .iter()
        .map(|(a, b)| {
            let (a, b) = (pose(*a), pose(*b));
            let c = y.inverse() * a * *x * b * z.inverse();
            MeanEquation::new(a, b, c)
        })
        .collect()
    }

    #[test]
    fn test_zero_cost_at_ground_truth() {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        assert_relative_eq!(score_combination(&x, &y, &z, &eqs, 1.5), 0.0, epsilon = 1e-8);
        assert!(score_combination(&z, &y, &x, &eqs, 1.5) > 1e-3);
    }

    #[test]
    fn test_derive_y_candidates() -> Result<(), Box<dyn std::error::Error>> {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        let xs = [x, z];
        let zs = [y, z, x];

        let ys = derive_y_candidates(&xs, &zs, &eqs)?;
        assert_eq!(ys.len(), 2 * 2 * 3);
        // equation-major, then X, then Z
        assert!(ys[1].abs_diff_eq(&eqs[0].solve_y(&x, &z), 1e-12));
        assert!(ys[2 * 3 + 1].abs_diff_eq(&eqs[1].solve_y(&x, &z), 1e-12));
        assert!(ys[4].abs_diff_eq(&eqs[0].solve_y(&z, &z), 1e-12));
        assert!(ys[1].abs_diff_eq(&y, 1e-10));
        assert!(ys[7].abs_diff_eq(&y, 1e-10));
        Ok(())
    }

    #[test]
    fn test_derive_y_empty() {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        assert_eq!(
            derive_y_candidates(&[], &[z], &eqs),
            Err(CalibError::EmptyCandidateSet { unknown: "X" })
        );
        assert_eq!(
            derive_y_candidates(&[x], &[], &eqs),
            Err(CalibError::EmptyCandidateSet { unknown: "Z" })
        );
    }

    #[test]
    fn test_select_best() -> Result<(), Box<dyn std::error::Error>> {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        let decoy = pose([0.0, 0.0, 3.0, 1.0, 1.0, 1.0]);

        let xs = [decoy, z, x];
        let ys = [x, y];
        let zs = [z, decoy];
        let best = select_best(&xs, &ys, &zs, &eqs, 1.5)?;

        assert_eq!(best.index, (2, 1, 0));
        assert!(best.cost < 1e-8);
        assert!(best.x.abs_diff_eq(&x, 1e-15));
        Ok(())
    }

    #[test]
    fn test_select_best_empty() {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        assert_eq!(
            select_best(&[x], &[], &[z], &eqs, 1.5),
            Err(CalibError::EmptyCandidateSet { unknown: "Y" })
        );
    }

    #[test]
    fn test_select_best_without_equations() {
        let (x, y, z) = ground_truth();
        assert_eq!(
            select_best(&[x], &[y], &[z], &[], 1.5),
            Err(CalibError::NoEquations)
        );
        assert_eq!(
            derive_y_candidates(&[x], &[z], &[]),
            Err(CalibError::NoEquations)
        );
    }

    #[test]
    fn test_select_best_non_finite() {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        let broken = SE3F64::from_rt(&DMat3::IDENTITY, DVec3::new(f64::NAN, 0.0, 0.0));

        assert_eq!(
            select_best(&[broken], &[y], &[z], &eqs, 1.5),
            Err(CalibError::NonFiniteCost)
        );
        // one finite triple is enough
        let best = select_best(&[broken, x], &[y], &[z], &eqs, 1.5);
        assert_eq!(best.map(|b| b.index), Ok((1, 0, 0)));
    }

    #[test]
    fn test_cost_table_layout() {
        let (x, y, z) = ground_truth();
        let eqs = consistent_equations(&x, &y, &z);
        let xs = [x, y];
        let ys = [x, y, z];
        let zs = [z, y, x, x];
        let table = build_cost_table(&xs, &ys, &zs, &eqs, 1.8);

        assert_eq!(table.shape, (2, 3, 4));
        assert_eq!(table.costs.len(), 24);
        assert_eq!(table.index(1, 2, 3), 23);
        assert_eq!(table.get(1, 2, 3), Some(table.costs[23]));
        assert_eq!(table.get(2, 0, 0), None);
        let expected = score_combination(&xs[1], &ys[0], &zs[2], &eqs, 1.8);
        assert_eq!(table.get(1, 0, 2), Some(expected));
    }

    #[test]
    fn test_argmin_ties_and_nan() {
        let table = CostTable {
            shape: (1, 2, 3),
            costs: vec![f64::NAN, 2.0, 1.0, 5.0, 1.0, 3.0],
        };
        assert_eq!(table.argmin(), Some(((0, 0, 2), 1.0)));

        let empty = CostTable {
            shape: (0, 0, 0),
            costs: vec![],
        };
        assert_eq!(empty.argmin(), None);
    }
}
