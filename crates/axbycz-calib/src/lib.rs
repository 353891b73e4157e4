#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types of the calibration engine.
pub mod error;

/// Candidate generation for `A·X = Y·B`.
pub mod hypotheses;

/// Rotation and translation distances, loop residuals.
pub mod metrics;

/// `Y` assembly and the `(X, Y, Z)` search.
pub mod selection;

/// The two- and three-stream `A·X·B = Y·C·Z` solvers.
pub mod solvers;

/// Manifold statistics of SE(3) sample sets.
pub mod stats;

pub use error::CalibError;
pub use hypotheses::{
    batch_solve_xy, generate_hypotheses, sorted_eigenbasis, BatchSolution, BatchSolveParams,
    Hypothesis, NoiseFloor, SIGN_FLIPS,
};
pub use metrics::{loop_residual, rotation_error, translation_error};
pub use selection::{
    build_cost_table, derive_y_candidates, score_combination, select_best, CostTable,
    MeanEquation, Selection,
};
pub use solvers::{solve_prob1, solve_prob2, DataStream, Solution, SolverConfig};
pub use stats::{mean_cov, Covariance6, ManifoldStats, MeanCovParams};
