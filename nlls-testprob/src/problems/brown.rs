use faer::{ColMut, ColRef, MatMut};

use crate::{
    EvalError, JacobianRequest, LeastSquaresSystem, RelativeTolerance, TestProblem, Workspace,
    jacobian::apply_dense, system::assert_dims,
};

/// Residuals.
const N: usize = 3;
/// Parameters.
const P: usize = 2;

const TARGET_X1: f64 = 1.0e6;
const TARGET_X2: f64 = 2.0e-6;

/// Brown's badly scaled function (Moré, Garbow and Hillstrom, problem 4).
///
/// ```text
/// r₁ = x₁ − 10⁶
/// r₂ = x₂ − 2·10⁻⁶
/// r₃ = x₁x₂ − 2
/// ```
///
/// The solution components differ by twelve orders of magnitude,
/// which exercises a solver's scale invariance.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrownBadlyScaled;

impl BrownBadlyScaled {
    /// Name used in verification labels.
    pub const NAME: &'static str = "brown_badly_scaled";
    /// Where solvers start.
    pub const INITIAL_GUESS: [f64; P] = [1.0, 1.0];
    /// The exact minimizer.
    pub const SOLUTION: [f64; P] = [TARGET_X1, TARGET_X2];
    /// Sum of squared residuals at the minimizer.
    pub const SOLUTION_SUMSQ: f64 = 0.0;
    /// Relative tolerance solutions are verified with.
    /// This is a fixed property of the test, not a statement about how precise
    /// solvers are in general.
    pub const RELATIVE_TOLERANCE: RelativeTolerance = RelativeTolerance::new_const(1.0e-12);

    /// Write the dense Jacobian. Rows 1 and 2 are constant, row 3 is linear in `x`.
    fn assemble(x: ColRef<'_, f64>, mut j: MatMut<'_, f64>) -> Result<(), EvalError> {
        let (x1, x2) = (x[0], x[1]);
        j[(0, 0)] = 1.0;
        j[(1, 1)] = 1.0;
        j[(2, 0)] = x2;
        j[(2, 1)] = x1;
        Ok(())
    }
}

impl LeastSquaresSystem for BrownBadlyScaled {
    fn residual_dim(&self) -> usize {
        N
    }

    fn parameter_dim(&self) -> usize {
        P
    }

    fn residual(
        &self,
        x: ColRef<'_, f64>,
        _workspace: &mut Workspace,
        mut f: ColMut<'_, f64>,
    ) -> Result<(), EvalError> {
        assert_dims(self, x, N, &f);
        let (x1, x2) = (x[0], x[1]);
        f[0] = x1 - TARGET_X1;
        f[1] = x2 - TARGET_X2;
        f[2] = x1 * x2 - 2.0;
        Ok(())
    }

    fn jacobian_action(
        &self,
        x: ColRef<'_, f64>,
        workspace: &mut Workspace,
        request: JacobianRequest<'_>,
    ) -> Result<(), EvalError> {
        assert_eq!(
            (workspace.residual_dim(), workspace.parameter_dim()),
            (N, P),
            "workspace was sized for a different system"
        );
        let j = workspace.jacobian_at(x, Self::assemble)?;
        apply_dense(j, request);
        Ok(())
    }

    fn curvature(
        &self,
        x: ColRef<'_, f64>,
        v: ColRef<'_, f64>,
        _workspace: &mut Workspace,
        mut fvv: ColMut<'_, f64>,
    ) -> Result<(), EvalError> {
        assert_dims(self, x, N, &fvv);
        assert_eq!(v.nrows(), P, "direction should have {P} entries");
        let (v1, v2) = (v[0], v[1]);
        fvv[0] = 0.0;
        fvv[1] = 0.0;
        fvv[2] = 2.0 * v1 * v2;
        Ok(())
    }
}

/// Brown's badly scaled function, with its initial guess and solution oracle.
pub fn brown_badly_scaled() -> TestProblem {
    TestProblem::new(
        BrownBadlyScaled::NAME,
        Box::new(BrownBadlyScaled),
        BrownBadlyScaled::INITIAL_GUESS.to_vec(),
        BrownBadlyScaled::SOLUTION.to_vec(),
        BrownBadlyScaled::SOLUTION_SUMSQ,
        BrownBadlyScaled::RELATIVE_TOLERANCE,
    )
}
