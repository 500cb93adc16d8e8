use crate::{Check, RelativeTolerance, Report, compare::compare_relative};

/// Knows the exact solution of one test problem, and judges solver output against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Oracle {
    /// Which problem this oracle belongs to. Used in labels.
    problem_name: String,
    /// The exact minimizer.
    expected_parameters: Vec<f64>,
    /// Sum of squared residuals at the minimizer.
    expected_sumsq: f64,
    relative_tolerance: RelativeTolerance,
}

impl Oracle {
    /// Oracle for the problem called `problem_name`.
    pub fn new(
        problem_name: impl Into<String>,
        expected_parameters: Vec<f64>,
        expected_sumsq: f64,
        relative_tolerance: RelativeTolerance,
    ) -> Self {
        Self {
            problem_name: problem_name.into(),
            expected_parameters,
            expected_sumsq,
            relative_tolerance,
        }
    }

    /// Which problem this oracle belongs to.
    pub fn problem_name(&self) -> &str {
        &self.problem_name
    }

    /// The exact minimizer.
    pub fn expected_parameters(&self) -> &[f64] {
        &self.expected_parameters
    }

    /// Sum of squared residuals at the minimizer.
    pub fn expected_sumsq(&self) -> f64 {
        self.expected_sumsq
    }

    /// How far each quantity may deviate, relative to its expected value.
    pub fn relative_tolerance(&self) -> RelativeTolerance {
        self.relative_tolerance
    }

    /// Same oracle, different tolerance.
    pub fn with_tolerance(mut self, relative_tolerance: RelativeTolerance) -> Self {
        self.relative_tolerance = relative_tolerance;
        self
    }

    /// Label for one verified quantity, e.g. `"lm/brown_badly_scaled i=0"`.
    pub fn label(&self, solver_name: &str, quantity: &str) -> String {
        format!("{solver_name}/{} {quantity}", self.problem_name)
    }

    /// Check a solver's final parameters and sum of squared residuals.
    ///
    /// The sum of squares is checked first, then each parameter in order.
    /// Every comparison is recorded, whether or not earlier ones failed.
    ///
    /// Panics if `computed_parameters` has the wrong length.
    pub fn verify(
        &self,
        solver_name: &str,
        computed_parameters: &[f64],
        computed_sumsq: f64,
    ) -> Report {
        assert_eq!(
            computed_parameters.len(),
            self.expected_parameters.len(),
            "{} has {} parameters but the solver returned {}",
            self.problem_name,
            self.expected_parameters.len(),
            computed_parameters.len()
        );
        let mut report = Report::new();
        self.check(
            &mut report,
            self.label(solver_name, "sumsq"),
            computed_sumsq,
            self.expected_sumsq,
        );
        for (i, (&observed, &expected)) in computed_parameters
            .iter()
            .zip(&self.expected_parameters)
            .enumerate()
        {
            self.check(
                &mut report,
                self.label(solver_name, &format!("i={i}")),
                observed,
                expected,
            );
        }
        report
    }

    fn check(&self, report: &mut Report, label: String, observed: f64, expected: f64) {
        let outcome = compare_relative(observed, expected, self.relative_tolerance);
        report.record(
            label,
            Check {
                observed,
                expected,
                outcome,
            },
        );
    }
}
