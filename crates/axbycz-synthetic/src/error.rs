use thiserror::Error;

/// Errors of the synthetic data generators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntheticError {
    /// A stream of zero samples was requested.
    #[error("Requested an empty stream")]
    EmptyStream,

    /// The perturbation covariance is not symmetric positive semi-definite.
    #[error("Covariance is not positive semi-definite (pivot {pivot} at row {row})")]
    NotPositiveSemiDefinite {
        /// Row of the failing Cholesky pivot.
        row: usize,
        /// Value of the failing pivot.
        pivot: f64,
    },

    /// The perturbation covariance is not symmetric.
    #[error("Covariance is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
    },

    /// A standard deviation or rate is negative or not finite.
    #[error("Invalid {name}: {value}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}
