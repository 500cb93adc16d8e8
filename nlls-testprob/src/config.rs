use crate::ConfigError;

/// Relative tolerance used by the original problem set.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Largest permitted ratio of absolute deviation to the expected magnitude.
/// Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeTolerance(f64);

impl RelativeTolerance {
    /// Validate a tolerance.
    pub fn new(tolerance: f64) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() {
            return Err(ConfigError::NonFiniteTolerance(tolerance));
        }
        if tolerance <= 0.0 {
            return Err(ConfigError::NonPositiveTolerance(tolerance));
        }
        Ok(Self(tolerance))
    }

    /// For tolerances fixed at compile time. Panics if `tolerance` is invalid.
    pub const fn new_const(tolerance: f64) -> Self {
        assert!(
            tolerance.is_finite() && tolerance > 0.0,
            "tolerance must be positive and finite"
        );
        Self(tolerance)
    }

    /// The raw tolerance.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for RelativeTolerance {
    fn default() -> Self {
        Self::new_const(DEFAULT_RELATIVE_TOLERANCE)
    }
}

impl TryFrom<f64> for RelativeTolerance {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Settings for the finite-difference derivative checks.
#[derive(Clone, Copy, Debug)]
pub struct CheckConfig {
    /// Relative finite-difference step. Each parameter is perturbed by
    /// `step * max(|x_j|, 1)`.
    pub step: f64,
    /// Relative step for the second difference used to check curvature.
    /// Larger than `step`, since the second difference divides by its square.
    pub curvature_step: f64,
    /// How far the analytic derivative may stray from the finite-difference estimate.
    pub tolerance: RelativeTolerance,
}

impl CheckConfig {
    /// Validate the step size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for step in [self.step, self.curvature_step] {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::InvalidStep(step));
            }
        }
        Ok(())
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            step: 1e-6,
            curvature_step: 1e-3,
            tolerance: RelativeTolerance(1e-6),
        }
    }
}
