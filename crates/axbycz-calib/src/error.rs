use thiserror::Error;

/// Structural failures of a calibration solve.
///
/// Numerical degeneracy (singular or indefinite covariance blocks) and
/// convergence failure of the mean iteration are not errors: they are reported
/// through `log::warn!` and the solve continues with a best-effort estimate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalibError {
    /// A sample set that must hold at least one transform is empty.
    #[error("Sample set `{name}` is empty")]
    EmptySampleSet {
        /// Label of the empty set.
        name: &'static str,
    },

    /// Streams that need per-index correspondence have different lengths.
    #[error("Mismatched array lengths: {left_name} ({left_len}) != {right_name} ({right_len})")]
    DimensionMismatch {
        /// Label for the left-hand slice.
        left_name: &'static str,
        /// Length of the left-hand slice.
        left_len: usize,
        /// Label for the right-hand slice.
        right_name: &'static str,
        /// Length of the right-hand slice.
        right_len: usize,
    },

    /// No SE(3)-valid candidate is left for one of the unknowns.
    #[error("No valid candidate for unknown `{unknown}`")]
    EmptyCandidateSet {
        /// The unknown (`"X"`, `"Y"` or `"Z"`) without candidates.
        unknown: &'static str,
    },

    /// No loop-closure equation was given to score candidates against.
    #[error("No loop-closure equation to score candidates against")]
    NoEquations,

    /// Every scored combination has a NaN or infinite cost.
    #[error("No candidate combination has a finite cost")]
    NonFiniteCost,
}

impl CalibError {
    /// Reject two slices of different lengths.
    pub fn check_lengths<T, U>(
        left_name: &'static str,
        left: &[T],
        right_name: &'static str,
        right: &[U],
    ) -> Result<(), CalibError> {
        if left.len() != right.len() {
            return Err(CalibError::DimensionMismatch {
                left_name,
                left_len: left.len(),
                right_name,
                right_len: right.len(),
            });
        }
        Ok(())
    }

    /// Reject an empty slice.
    pub fn check_non_empty<T>(name: &'static str, samples: &[T]) -> Result<(), CalibError> {
        if samples.is_empty() {
            return Err(CalibError::EmptySampleSet { name });
        }
        Ok(())
    }
}
