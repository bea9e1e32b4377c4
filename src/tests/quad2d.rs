use crate::{sqp, HessianApprox, LagrangianHessian, Nlp, Objective, Options, Status};
use float_cmp::assert_approx_eq;
use ndarray::{array, Array1, Array2, ArrayView1};

/// Unconstrained convex quadratic `f(x) = (x1 - 1)^2 + (x2 - 2)^2` with
/// minimizer (1, 2).
struct ShiftedQuadratic {}

impl Objective for ShiftedQuadratic {
    fn eval(
        &self,
        x: ArrayView1<f64>,
        _p: ArrayView1<f64>,
        gradient: bool,
    ) -> (f64, Option<Array1<f64>>) {
        let f = (x[0] - 1.0).powi(2) + (x[1] - 2.0).powi(2);
        let df = gradient.then(|| array![2.0 * (x[0] - 1.0), 2.0 * (x[1] - 2.0)]);
        (f, df)
    }
}

struct ShiftedQuadraticHessian {}

impl LagrangianHessian for ShiftedQuadraticHessian {
    fn eval(
        &self,
        _x: ArrayView1<f64>,
        _lam: ArrayView1<f64>,
        sigma: f64,
        _p: ArrayView1<f64>,
    ) -> Array2<f64> {
        Array2::eye(2) * (2.0 * sigma)
    }
}

#[test]
fn unconstrained_quadratic() {
    let f2 = ShiftedQuadratic {};
    let nlp = Nlp::new(&f2);

    let solution = sqp(
        &nlp,
        array![0.0, 0.0].view(),
        None,
        &Options::default(),
        None,
    )
    .unwrap();

    assert!(solution.status.converged());
    assert!(solution.iterations <= 5);
    assert_approx_eq!(f64, solution.x[0], 1.0, epsilon = 1e-8);
    assert_approx_eq!(f64, solution.x[1], 2.0, epsilon = 1e-8);
    assert!(solution.cost.abs() < 1e-12);
    assert!(solution.multipliers.lam.is_empty());
}

#[test]
fn unconstrained_quadratic_exact_hessian() {
    let f2 = ShiftedQuadratic {};
    let d2f = ShiftedQuadraticHessian {};
    let nlp = Nlp::new(&f2).with_hessian(&d2f);
    let opt = Options {
        hessian_approximation: HessianApprox::Exact,
        ..Default::default()
    };

    let solution = sqp(&nlp, array![0.0, 0.0].view(), None, &opt, None).unwrap();

    // The first subproblem is the exact Newton step onto the minimizer;
    // the second pass only detects that there is nothing left to do.
    assert!(solution.status.converged());
    assert!(solution.iterations <= 2);
    assert_approx_eq!(f64, solution.x[0], 1.0, epsilon = 1e-12);
    assert_approx_eq!(f64, solution.x[1], 2.0, epsilon = 1e-12);
}

#[test]
fn restart_from_optimum_terminates_immediately() {
    let f2 = ShiftedQuadratic {};
    let nlp = Nlp::new(&f2);

    let solution = sqp(
        &nlp,
        array![1.0, 2.0].view(),
        None,
        &Options::default(),
        None,
    )
    .unwrap();

    assert_eq!(solution.status, Status::SmallStep);
    assert_eq!(solution.iterations, 1);
    assert_eq!(solution.x[0], 1.0);
    assert_eq!(solution.x[1], 2.0);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// BFGS reaches the minimizer of a convex quadratic from any
        /// finite starting point.
        #[test]
        fn quadratic_converges_from_any_start(
            x0 in -50.0f64..50.0,
            y0 in -50.0f64..50.0,
        ) {
            let f2 = ShiftedQuadratic {};
            let nlp = Nlp::new(&f2);

            let solution = sqp(
                &nlp,
                array![x0, y0].view(),
                None,
                &Options::default(),
                None,
            )
            .unwrap();

            prop_assert!(solution.status.converged());
            prop_assert!((solution.x[0] - 1.0).abs() < 1e-6);
            prop_assert!((solution.x[1] - 2.0).abs() < 1e-6);
        }
    }
}
