use crate::RelativeTolerance;

/// Result of comparing one computed quantity against its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum Outcome {
    /// Within tolerance.
    Pass,
    /// Outside tolerance.
    Fail,
    /// The expected value is subnormal, so a relative comparison means nothing.
    /// Treated as a failure.
    SubnormalExpected,
}

impl Outcome {
    /// Did the comparison pass?
    pub fn is_pass(self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// `|observed − expected| / |expected|`, or `|observed|` when `expected` is exactly zero.
pub fn relative_error(observed: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        libm::fabs(observed)
    } else {
        libm::fabs(observed - expected) / libm::fabs(expected)
    }
}

/// Compare `observed` against `expected` within a relative tolerance.
///
/// NaN only matches NaN and infinity only matches infinity of the same sign.
/// An expected value of exactly zero falls back to an absolute comparison.
pub fn compare_relative(observed: f64, expected: f64, tolerance: RelativeTolerance) -> Outcome {
    let passed = if observed.is_nan() || expected.is_nan() {
        observed.is_nan() == expected.is_nan()
    } else if observed.is_infinite() || expected.is_infinite() {
        observed == expected
    } else if expected.is_subnormal() {
        return Outcome::SubnormalExpected;
    } else {
        relative_error(observed, expected) <= tolerance.get()
    };
    if passed { Outcome::Pass } else { Outcome::Fail }
}
