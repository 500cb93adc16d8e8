//! Test problems for large-scale nonlinear least-squares solvers.
//!
//! A problem implements [`LeastSquaresSystem`]: residuals, the action of the
//! analytic Jacobian (`J u`, `Jᵀ u` and the lower triangle of `JᵀJ`), and the
//! directional curvature `fvv` used by geodesic acceleration.
//! Each [`TestProblem`] comes with an [`Oracle`] which knows the exact solution
//! and checks a solver's answer against it, recording every comparison in a [`Report`].
//!
//! ```
//! use nlls_testprob::problems::brown_badly_scaled;
//!
//! let problem = brown_badly_scaled();
//! let report = problem.verify("lm", &[1.0e6, 2.0e-6], 0.0);
//! assert!(report.all_passed());
//! ```

pub use crate::compare::{Outcome, compare_relative, relative_error};
pub use crate::config::{CheckConfig, DEFAULT_RELATIVE_TOLERANCE, RelativeTolerance};
pub use crate::error::{ConfigError, EvalError, Quantity};
pub use crate::eval::{EvalCounts, Evaluator, sum_of_squares};
pub use crate::jacobian::{JacobianRequest, Product, Transpose, apply_dense, lower_quadratic_form};
pub use crate::oracle::Oracle;
pub use crate::problems::BrownBadlyScaled;
pub use crate::report::{Check, Report};
pub use crate::system::LeastSquaresSystem;
pub use crate::test_problem::TestProblem;
pub use crate::workspace::Workspace;

/// Comparing computed values against expected ones.
mod compare;
/// Tolerances and other settings.
mod config;
/// Finite-difference checks of a problem's derivatives.
pub mod derivative_check;
mod error;
/// Counting, checked evaluation of a problem's callbacks.
mod eval;
/// Jacobian requests and dense Jacobian helpers.
mod jacobian;
/// Verifying solver output.
mod oracle;
pub mod problems;
/// Pass/fail records.
mod report;
/// The callback contract every problem implements.
mod system;
mod test_problem;
/// Scratch space owned by the solver.
mod workspace;
