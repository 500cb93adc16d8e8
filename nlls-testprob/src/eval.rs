use faer::{ColMut, ColRef, MatRef};

use crate::{EvalError, JacobianRequest, LeastSquaresSystem, Quantity, Workspace};

/// How many times each callback was invoked through an [`Evaluator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalCounts {
    /// Residual evaluations.
    pub residual: usize,
    /// Jacobian-vector products, `J u` or `Jᵀ u`.
    pub jacobian_vector: usize,
    /// Gram matrix `JᵀJ` evaluations.
    pub jacobian_gram: usize,
    /// Curvature `fvv` evaluations.
    pub curvature: usize,
}

/// The boundary a solver calls a problem through.
///
/// Owns the problem's workspace, counts evaluations,
/// and turns NaN or infinite outputs into [`EvalError::NonFinite`].
/// What to do about an error (retry from another point, give up) is up to the solver.
pub struct Evaluator<'s> {
    system: &'s dyn LeastSquaresSystem,
    workspace: Workspace,
    counts: EvalCounts,
}

impl<'s> Evaluator<'s> {
    /// Evaluator with a fresh workspace for `system`.
    pub fn new(system: &'s dyn LeastSquaresSystem) -> Self {
        assert!(
            system.parameter_dim() <= system.residual_dim(),
            "a least-squares system needs at least as many residuals ({}) as parameters ({})",
            system.residual_dim(),
            system.parameter_dim()
        );
        Self {
            workspace: system.workspace(),
            system,
            counts: EvalCounts::default(),
        }
    }

    /// The system being evaluated.
    pub fn system(&self) -> &'s dyn LeastSquaresSystem {
        self.system
    }

    /// Number of residuals, N.
    pub fn residual_dim(&self) -> usize {
        self.system.residual_dim()
    }

    /// Number of parameters, P.
    pub fn parameter_dim(&self) -> usize {
        self.system.parameter_dim()
    }

    /// Evaluations so far.
    pub fn counts(&self) -> EvalCounts {
        self.counts
    }

    /// The workspace the callbacks are given.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Compute `f(x)`.
    pub fn eval_f(&mut self, x: ColRef<'_, f64>, mut f: ColMut<'_, f64>) -> Result<(), EvalError> {
        self.assert_params(x);
        assert_eq!(f.nrows(), self.residual_dim(), "f must have N entries");
        self.counts.residual += 1;
        self.system.residual(x, &mut self.workspace, f.as_mut())?;
        ensure_finite(Quantity::Residual, f.as_ref())
    }

    /// Apply the Jacobian at `x`.
    pub fn eval_df(
        &mut self,
        x: ColRef<'_, f64>,
        mut request: JacobianRequest<'_>,
    ) -> Result<(), EvalError> {
        self.assert_params(x);
        request.assert_dims(self.residual_dim(), self.parameter_dim());
        if request.product.is_some() {
            self.counts.jacobian_vector += 1;
        }
        if request.gram.is_some() {
            self.counts.jacobian_gram += 1;
        }
        self.system
            .jacobian_action(x, &mut self.workspace, request.rb_mut())?;
        if let Some(product) = &request.product {
            ensure_finite(Quantity::JacobianVector, product.out.as_ref())?;
        }
        if let Some(gram) = &request.gram {
            ensure_finite_lower(gram.as_ref())?;
        }
        Ok(())
    }

    /// Compute the second directional derivative `fvv` of the residuals along `v`.
    pub fn eval_fvv(
        &mut self,
        x: ColRef<'_, f64>,
        v: ColRef<'_, f64>,
        mut fvv: ColMut<'_, f64>,
    ) -> Result<(), EvalError> {
        self.assert_params(x);
        assert_eq!(v.nrows(), self.parameter_dim(), "v must have P entries");
        assert_eq!(fvv.nrows(), self.residual_dim(), "fvv must have N entries");
        self.counts.curvature += 1;
        self.system
            .curvature(x, v, &mut self.workspace, fvv.as_mut())?;
        ensure_finite(Quantity::Curvature, fvv.as_ref())
    }

    fn assert_params(&self, x: ColRef<'_, f64>) {
        assert_eq!(
            x.nrows(),
            self.parameter_dim(),
            "x must have {} entries, got {}",
            self.parameter_dim(),
            x.nrows()
        );
    }
}

/// `‖f‖²`.
pub fn sum_of_squares(f: ColRef<'_, f64>) -> f64 {
    f.iter().map(|r| r * r).sum()
}

fn ensure_finite(quantity: Quantity, values: ColRef<'_, f64>) -> Result<(), EvalError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => {
            tracing::warn!(%quantity, index, "callback produced a non-finite value");
            Err(EvalError::NonFinite { quantity, index })
        }
        None => Ok(()),
    }
}

/// Only the lower triangle of a Gram matrix is meaningful.
/// Indices are flattened column by column through that triangle.
fn ensure_finite_lower(gram: MatRef<'_, f64>) -> Result<(), EvalError> {
    let mut index = 0;
    for col in 0..gram.ncols() {
        for row in col..gram.nrows() {
            if !gram[(row, col)].is_finite() {
                tracing::warn!(quantity = %Quantity::Gram, index, "callback produced a non-finite value");
                return Err(EvalError::NonFinite {
                    quantity: Quantity::Gram,
                    index,
                });
            }
            index += 1;
        }
    }
    Ok(())
}
