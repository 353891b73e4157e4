//! Distances between rigid transforms used to score calibration candidates.

use axbycz_lie::SE3F64;

use crate::error::CalibError;

/// Geodesic angle between the rotation blocks, `‖log(R_lᵀ·R_r)‖` in radians.
pub fn rotation_error(left: &SE3F64, right: &SE3F64) -> f64 {
    (left.rotation.inverse() * right.rotation).log().length()
}

/// Euclidean distance between the translation blocks.
pub fn translation_error(left: &SE3F64, right: &SE3F64) -> f64 {
    left.translation.distance(right.translation)
}

/// Mean Frobenius norm of `Aᵢ·X·Bᵢ − Y·Cᵢ·Z` over corresponding triples.
///
/// # Errors
///
/// * [`CalibError::EmptySampleSet`] if the streams are empty.
/// * [`CalibError::DimensionMismatch`] if they differ in length.
pub fn loop_residual(
    a: &[SE3F64],
    b: &[SE3F64],
    c: &[SE3F64],
    x: &SE3F64,
    y: &SE3F64,
    z: &SE3F64,
) -> Result<f64, CalibError> {
    CalibError::check_non_empty("A", a)?;
    CalibError::check_lengths("A", a, "B", b)?;
    CalibError::check_lengths("A", a, "C", c)?;

    let total: f64 = a
        .iter()
        .zip(b)
        .zip(c)
        .map(|((ai, bi), ci)| {
            let lhs = (*ai * *x * *bi).matrix();
            let rhs = (*y * *ci * *z).matrix();
            (lhs - rhs)
                .to_cols_array()
                .iter()
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt()
        })
        .sum();

    Ok(total / a.len() as f64)
}
