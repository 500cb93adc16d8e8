use faer::{Col, ColRef, Mat};
use proptest::prelude::*;

use crate::{
    BrownBadlyScaled, JacobianRequest, LeastSquaresSystem, Outcome, Transpose,
    lower_quadratic_form, problems::brown_badly_scaled,
};

fn jacobian_times(x: [f64; 2], u: [f64; 2]) -> Col<f64> {
    let mut ws = BrownBadlyScaled.workspace();
    let mut out = Col::zeros(3);
    BrownBadlyScaled
        .jacobian_action(
            ColRef::from_slice(&x),
            &mut ws,
            JacobianRequest::product(Transpose::No, ColRef::from_slice(&u), out.as_mut()),
        )
        .unwrap();
    out
}

proptest! {
    #[test]
    fn jacobian_columns_hold_everywhere(
        x1 in -1.0e7..1.0e7f64,
        x2 in -1.0e7..1.0e7f64,
    ) {
        let col0 = jacobian_times([x1, x2], [1.0, 0.0]);
        let col1 = jacobian_times([x1, x2], [0.0, 1.0]);
        prop_assert_eq!([col0[0], col0[1], col0[2]], [1.0, 0.0, x2]);
        prop_assert_eq!([col1[0], col1[1], col1[2]], [0.0, 1.0, x1]);
    }

    #[test]
    fn residual_formula(
        x1 in -1.0e7..1.0e7f64,
        x2 in -1.0e7..1.0e7f64,
    ) {
        let mut ws = BrownBadlyScaled.workspace();
        let mut f = Col::zeros(3);
        BrownBadlyScaled
            .residual(ColRef::from_slice(&[x1, x2]), &mut ws, f.as_mut())
            .unwrap();
        prop_assert_eq!([f[0], f[1], f[2]], [x1 - 1.0e6, x2 - 2.0e-6, x1 * x2 - 2.0]);
    }

    #[test]
    fn curvature_ignores_the_point(
        x1 in -1.0e7..1.0e7f64,
        x2 in -1.0e7..1.0e7f64,
        v1 in -1.0e3..1.0e3f64,
        v2 in -1.0e3..1.0e3f64,
    ) {
        let mut ws = BrownBadlyScaled.workspace();
        let mut fvv = Col::zeros(3);
        BrownBadlyScaled
            .curvature(
                ColRef::from_slice(&[x1, x2]),
                ColRef::from_slice(&[v1, v2]),
                &mut ws,
                fvv.as_mut(),
            )
            .unwrap();
        prop_assert_eq!([fvv[0], fvv[1], fvv[2]], [0.0, 0.0, 2.0 * v1 * v2]);
    }

    #[test]
    fn gram_matches_products(
        x1 in -1.0e3..1.0e3f64,
        x2 in -1.0e3..1.0e3f64,
        u1 in -1.0e3..1.0e3f64,
        u2 in -1.0e3..1.0e3f64,
    ) {
        let x = [x1, x2];
        let u = [u1, u2];
        let mut ws = BrownBadlyScaled.workspace();
        let mut ju = Col::zeros(3);
        let mut gram = Mat::zeros(2, 2);
        BrownBadlyScaled
            .jacobian_action(
                ColRef::from_slice(&x),
                &mut ws,
                JacobianRequest::product(Transpose::No, ColRef::from_slice(&u), ju.as_mut())
                    .with_gram(gram.as_mut()),
            )
            .unwrap();
        let mut jtju = Col::zeros(2);
        BrownBadlyScaled
            .jacobian_action(
                ColRef::from_slice(&x),
                &mut ws,
                JacobianRequest::product(Transpose::Yes, ju.as_ref(), jtju.as_mut()),
            )
            .unwrap();
        // One assembly served all three outputs.
        prop_assert_eq!(ws.assemblies(), 1);

        let quadratic = lower_quadratic_form(gram.as_ref(), ColRef::from_slice(&u));
        let via_norm: f64 = ju.iter().map(|v| v * v).sum();
        let via_transpose = u1 * jtju[0] + u2 * jtju[1];

        // Rounding is bounded by the size of the terms being summed, not the result,
        // since the terms can cancel.
        let scale = 1.0
            + gram[(0, 0)].abs() * u1 * u1
            + 2.0 * gram[(1, 0)].abs() * (u1 * u2).abs()
            + gram[(1, 1)].abs() * u2 * u2;
        prop_assert!((quadratic - via_norm).abs() <= 1e-12 * scale);
        prop_assert!((quadratic - via_transpose).abs() <= 1e-12 * scale);
    }

    #[test]
    fn one_bad_parameter_fails_only_itself(
        index in 0usize..2,
        magnitude in 1.0e-9..1.0e-3f64,
        negative in any::<bool>(),
    ) {
        let delta = if negative { -magnitude } else { magnitude };
        let mut params = BrownBadlyScaled::SOLUTION;
        params[index] *= 1.0 + delta;
        let report = brown_badly_scaled().verify("prop", &params, 0.0);
        prop_assert_eq!(report.len(), 3);
        for (i, expected) in BrownBadlyScaled::SOLUTION.iter().enumerate() {
            let check = report.get(&format!("prop/brown_badly_scaled i={i}")).unwrap();
            prop_assert_eq!(check.expected, *expected);
            let want = if i == index { Outcome::Fail } else { Outcome::Pass };
            prop_assert_eq!(check.outcome, want);
        }
        prop_assert_eq!(
            report.get("prop/brown_badly_scaled sumsq").unwrap().outcome,
            Outcome::Pass
        );
    }

    #[test]
    fn tiny_sumsq_passes(sumsq in 0.0..1.0e-12f64) {
        let report = brown_badly_scaled().verify("prop", &BrownBadlyScaled::SOLUTION, sumsq);
        prop_assert!(report.all_passed());
    }
}
