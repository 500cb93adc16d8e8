use crate::{Evaluator, LeastSquaresSystem, Oracle, RelativeTolerance, Report, Workspace};

/// One named test case: the problem, where to start, and how to check the answer.
pub struct TestProblem {
    name: &'static str,
    system: Box<dyn LeastSquaresSystem + Send + Sync>,
    initial_guess: Vec<f64>,
    oracle: Oracle,
}

impl TestProblem {
    /// Bundle a system with its starting point and exact solution.
    ///
    /// Panics if the initial guess or the solution don't have exactly P entries,
    /// or if the system has more parameters than residuals.
    pub fn new(
        name: &'static str,
        system: Box<dyn LeastSquaresSystem + Send + Sync>,
        initial_guess: Vec<f64>,
        expected_parameters: Vec<f64>,
        expected_sumsq: f64,
        relative_tolerance: RelativeTolerance,
    ) -> Self {
        let p = system.parameter_dim();
        assert!(
            p <= system.residual_dim(),
            "{name} has {p} parameters but only {} residuals",
            system.residual_dim()
        );
        assert_eq!(
            initial_guess.len(),
            p,
            "{name}: initial guess must have exactly {p} entries"
        );
        assert_eq!(
            expected_parameters.len(),
            p,
            "{name}: solution must have exactly {p} entries"
        );
        Self {
            name,
            system,
            initial_guess,
            oracle: Oracle::new(name, expected_parameters, expected_sumsq, relative_tolerance),
        }
    }

    /// Name used in labels.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The residual system.
    pub fn system(&self) -> &(dyn LeastSquaresSystem + Send + Sync) {
        self.system.as_ref()
    }

    /// Where solvers start.
    pub fn initial_guess(&self) -> &[f64] {
        &self.initial_guess
    }

    /// The oracle for this problem.
    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    /// Change how strictly solutions are verified.
    pub fn set_relative_tolerance(&mut self, relative_tolerance: RelativeTolerance) {
        self.oracle = self.oracle.clone().with_tolerance(relative_tolerance);
    }

    /// A fresh workspace for one solver run.
    pub fn workspace(&self) -> Workspace {
        self.system.workspace()
    }

    /// A fresh counting evaluator for one solver run.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(self.system.as_ref())
    }

    /// Verify what `solver_name` found. See [`Oracle::verify`].
    pub fn verify(&self, solver_name: &str, computed_parameters: &[f64], computed_sumsq: f64) -> Report {
        self.oracle
            .verify(solver_name, computed_parameters, computed_sumsq)
    }
}

impl std::fmt::Debug for TestProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestProblem")
            .field("name", &self.name)
            .field("residual_dim", &self.system.residual_dim())
            .field("parameter_dim", &self.system.parameter_dim())
            .field("initial_guess", &self.initial_guess)
            .field("oracle", &self.oracle)
            .finish()
    }
}
