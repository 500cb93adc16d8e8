/// Errors a problem's callbacks can report back to the solver.
///
/// These are the only runtime failures of the callback contract.
/// Dimension mismatches are programming errors and panic instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum EvalError {
    /// The callback was asked to evaluate outside its mathematical domain.
    #[error("Evaluation is undefined at this point: {reason}")]
    Domain {
        /// Why the point is outside the domain.
        reason: String,
    },
    /// A callback produced a value which is NaN or infinite.
    #[error("{quantity}[{index}] is not finite")]
    NonFinite {
        /// Which output was being computed.
        quantity: Quantity,
        /// Offset of the bad value within that output.
        index: usize,
    },
}

/// The outputs a problem can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Quantity {
    /// Residual vector `f(x)`.
    Residual,
    /// `J u` or `Jᵀ u`.
    JacobianVector,
    /// Lower triangle of `JᵀJ`.
    Gram,
    /// Second directional derivative `fvv`.
    Curvature,
}

impl std::fmt::Display for Quantity {
    #[mutants::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Quantity::Residual => "f",
            Quantity::JacobianVector => "J*u",
            Quantity::Gram => "JTJ",
            Quantity::Curvature => "fvv",
        };
        f.write_str(name)
    }
}

/// Invalid configuration values.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum ConfigError {
    /// Tolerances must be strictly positive.
    #[error("Tolerance must be positive, but was {0}")]
    NonPositiveTolerance(f64),
    /// Tolerances must be finite.
    #[error("Tolerance must be finite, but was {0}")]
    NonFiniteTolerance(f64),
    /// Finite-difference steps must be strictly positive and finite.
    #[error("Finite-difference step must be positive and finite, but was {0}")]
    InvalidStep(f64),
}
