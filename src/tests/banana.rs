use crate::{sqp, Nlp, Objective, Options};
use float_cmp::assert_approx_eq;
use ndarray::{array, Array1, ArrayView1};

/// 2-dimensional unconstrained optimization of Rosenbrock's "banana"
/// function:
///
/// ```txt
///     f(x) = 100(x_2 - x_1^2)^2 + (1 - x_1)^2
/// ```
///
/// https://en.wikipedia.org/wiki/Rosenbrock_function
struct BananaFunction {}

impl Objective for BananaFunction {
    fn eval(
        &self,
        x: ArrayView1<f64>,
        _p: ArrayView1<f64>,
        gradient: bool,
    ) -> (f64, Option<Array1<f64>>) {
        let a = 100.0;
        let f = a * (x[1] - x[0].powi(2)).powi(2) + (1.0 - x[0]).powi(2);
        let df = gradient.then(|| {
            array![
                4.0 * a * (x[0].powi(3) - x[0] * x[1]) + 2.0 * x[0] - 2.0,
                2.0 * a * (x[1] - x[0].powi(2)),
            ]
        });
        (f, df)
    }
}

#[test]
fn unconstrained_banana() {
    let f2 = BananaFunction {};
    let nlp = Nlp::new(&f2);
    let opt = Options {
        maxiter: 200,
        ..Default::default()
    };

    let solution = sqp(&nlp, array![-1.2, 1.0].view(), None, &opt, None).unwrap();

    assert!(solution.status.converged());
    assert_approx_eq!(f64, solution.x[0], 1.0, epsilon = 1e-6);
    assert_approx_eq!(f64, solution.x[1], 1.0, epsilon = 1e-6);
    assert!(solution.cost < 1e-10);
}

#[test]
fn banana_restart_from_optimum() {
    let f2 = BananaFunction {};
    let nlp = Nlp::new(&f2);

    let solution = sqp(
        &nlp,
        array![1.0, 1.0].view(),
        None,
        &Options::default(),
        None,
    )
    .unwrap();

    assert!(solution.status.converged());
    assert_eq!(solution.iterations, 1);
    assert_eq!(solution.x[0], 1.0);
    assert_eq!(solution.x[1], 1.0);
}
