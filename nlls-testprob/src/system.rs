use faer::{ColMut, ColRef};

use crate::{EvalError, JacobianRequest, Workspace};

/// A nonlinear least-squares test problem: minimize `½‖f(x)‖²` where
/// `f` maps P parameters to N residuals.
///
/// Every callback is a pure function of its inputs. The only mutable state
/// is the caller's [`Workspace`], which the solver owns and the problem may use
/// as scratch space. Callbacks are never invoked concurrently on one workspace.
///
/// Vectors passed in must match [`residual_dim`](Self::residual_dim) and
/// [`parameter_dim`](Self::parameter_dim); implementations panic otherwise.
pub trait LeastSquaresSystem {
    /// Number of residuals, N.
    fn residual_dim(&self) -> usize;

    /// Number of parameters, P. Never larger than N.
    fn parameter_dim(&self) -> usize;

    /// Write the N residuals `f(x)` into `f`.
    fn residual(
        &self,
        x: ColRef<'_, f64>,
        workspace: &mut Workspace,
        f: ColMut<'_, f64>,
    ) -> Result<(), EvalError>;

    /// Apply the analytic Jacobian at `x`, as described by `request`.
    ///
    /// The Jacobian is exact, never a finite-difference estimate.
    /// It's assembled at most once per call no matter how many outputs were requested.
    fn jacobian_action(
        &self,
        x: ColRef<'_, f64>,
        workspace: &mut Workspace,
        request: JacobianRequest<'_>,
    ) -> Result<(), EvalError>;

    /// Write `vᵀ Hᵢ v` for every residual `i` into `fvv`,
    /// where `Hᵢ` is the Hessian of residual `i` at `x`.
    /// Residuals which are affine in `x` get exactly zero.
    fn curvature(
        &self,
        x: ColRef<'_, f64>,
        v: ColRef<'_, f64>,
        workspace: &mut Workspace,
        fvv: ColMut<'_, f64>,
    ) -> Result<(), EvalError>;

    /// A workspace sized for this system.
    fn workspace(&self) -> Workspace {
        Workspace::new(self.residual_dim(), self.parameter_dim())
    }
}

/// Panics unless `x` has exactly P entries and `out` exactly `out_len`.
pub(crate) fn assert_dims(
    system: &(impl LeastSquaresSystem + ?Sized),
    x: ColRef<'_, f64>,
    out_len: usize,
    out: &ColMut<'_, f64>,
) {
    assert_eq!(
        x.nrows(),
        system.parameter_dim(),
        "expected {} parameters but got {}",
        system.parameter_dim(),
        x.nrows()
    );
    assert_eq!(
        out.nrows(),
        out_len,
        "output vector should have {out_len} entries but has {}",
        out.nrows()
    );
}
