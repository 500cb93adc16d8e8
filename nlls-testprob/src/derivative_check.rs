//! Check a problem's analytic derivatives against finite differences of its residuals.
//!
//! Problems themselves never use finite differences. These checks are for the
//! people writing them, to catch a wrong Jacobian or curvature before a solver does.

use faer::{Col, ColRef};

use crate::{
    Check, CheckConfig, ConfigError, EvalError, JacobianRequest, LeastSquaresSystem, Report,
    Transpose, compare::compare_relative,
};

/// Things that stop a derivative check from running at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum CheckError {
    /// The check was misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// One of the problem's callbacks failed.
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// The direction to differentiate along was all zeroes.
    #[error("The direction must have at least one nonzero entry")]
    ZeroDirection,
}

/// Compare `J u` at `x` against the central difference
/// `(f(x + h u) − f(x − h u)) / 2h`, one check per residual.
///
/// Labels are `"<problem> J*u[i]"`.
pub fn check_jacobian(
    problem_name: &str,
    system: &dyn LeastSquaresSystem,
    x: &[f64],
    u: &[f64],
    config: CheckConfig,
) -> Result<Report, CheckError> {
    config.validate()?;
    let n = system.residual_dim();
    let h = step_along(x, u, config.step)?;
    let mut workspace = system.workspace();

    let mut analytic = Col::<f64>::zeros(n);
    system.jacobian_action(
        ColRef::from_slice(x),
        &mut workspace,
        JacobianRequest::product(Transpose::No, ColRef::from_slice(u), analytic.as_mut()),
    )?;

    let plus = residual_at(system, &offset(x, u, h))?;
    let minus = residual_at(system, &offset(x, u, -h))?;

    let mut report = Report::new();
    for i in 0..n {
        let estimate = (plus[i] - minus[i]) / (2.0 * h);
        record(
            &mut report,
            format!("{problem_name} J*u[{i}]"),
            estimate,
            analytic[i],
            config,
        );
    }
    Ok(report)
}

/// Compare `fvv` at `x` along `v` against the second central difference
/// `(f(x + h v) − 2 f(x) + f(x − h v)) / h²`, one check per residual.
///
/// Labels are `"<problem> fvv[i]"`.
pub fn check_curvature(
    problem_name: &str,
    system: &dyn LeastSquaresSystem,
    x: &[f64],
    v: &[f64],
    config: CheckConfig,
) -> Result<Report, CheckError> {
    config.validate()?;
    let n = system.residual_dim();
    let h = step_along(x, v, config.curvature_step)?;
    let mut workspace = system.workspace();

    let mut analytic = Col::<f64>::zeros(n);
    system.curvature(
        ColRef::from_slice(x),
        ColRef::from_slice(v),
        &mut workspace,
        analytic.as_mut(),
    )?;

    let center = residual_at(system, x)?;
    let plus = residual_at(system, &offset(x, v, h))?;
    let minus = residual_at(system, &offset(x, v, -h))?;

    let mut report = Report::new();
    for i in 0..n {
        let estimate = (plus[i] - 2.0 * center[i] + minus[i]) / (h * h);
        record(
            &mut report,
            format!("{problem_name} fvv[{i}]"),
            estimate,
            analytic[i],
            config,
        );
    }
    Ok(report)
}

fn record(report: &mut Report, label: String, observed: f64, expected: f64, config: CheckConfig) {
    let outcome = compare_relative(observed, expected, config.tolerance);
    report.record(
        label,
        Check {
            observed,
            expected,
            outcome,
        },
    );
}

/// Step length along `direction`, scaled so the largest move in any parameter
/// is `relative_step * max(‖x‖∞, 1)`.
fn step_along(x: &[f64], direction: &[f64], relative_step: f64) -> Result<f64, CheckError> {
    let direction_norm = direction.iter().map(|d| libm::fabs(*d)).fold(0.0, libm::fmax);
    if direction_norm == 0.0 {
        return Err(CheckError::ZeroDirection);
    }
    let x_norm = x.iter().map(|v| libm::fabs(*v)).fold(1.0, libm::fmax);
    Ok(relative_step * x_norm / direction_norm)
}

fn offset(x: &[f64], direction: &[f64], h: f64) -> Vec<f64> {
    assert_eq!(x.len(), direction.len(), "x and the direction must have the same length");
    x.iter().zip(direction).map(|(x, d)| x + h * d).collect()
}

fn residual_at(system: &dyn LeastSquaresSystem, x: &[f64]) -> Result<Col<f64>, EvalError> {
    let mut workspace = system.workspace();
    let mut f = Col::zeros(system.residual_dim());
    system.residual(ColRef::from_slice(x), &mut workspace, f.as_mut())?;
    Ok(f)
}
