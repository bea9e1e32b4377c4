use crate::{DenseIpm, QpProblem, QpSolver};
use float_cmp::assert_approx_eq;
use ndarray::{array, Array1, Array2, ArrayView1, ArrayView2};
use sprs::CsMat;

fn solve(
    h: ArrayView2<f64>,
    g: ArrayView1<f64>,
    a: &CsMat<f64>,
    lba: ArrayView1<f64>,
    uba: ArrayView1<f64>,
    lbx: ArrayView1<f64>,
    ubx: ArrayView1<f64>,
) -> crate::QpSolution {
    let qp = QpProblem {
        h,
        g,
        a: a.view(),
        lba,
        uba,
        lbx,
        ubx,
    };
    DenseIpm::default().solve(&qp).unwrap()
}

fn free(n: usize) -> (Array1<f64>, Array1<f64>) {
    (
        Array1::from_elem(n, f64::NEG_INFINITY),
        Array1::from_elem(n, f64::INFINITY),
    )
}

/// Unconstrained 3-d quadratic from http://www.akiti.ca/QuadProgEx0Constr.html.
#[test]
fn unconstrained_3d_quadratic() {
    let h = array![[5.0, -2.0, -1.0], [-2.0, 4.0, 3.0], [-1.0, 3.0, 5.0]];
    let g = array![2.0, -35.0, -47.0];
    let a = CsMat::zero((0, 3));
    let empty = Array1::zeros(0);
    let (lbx, ubx) = free(3);

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        empty.view(),
        empty.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_approx_eq!(f64, sol.primal[0], 3.0, epsilon = 1e-8);
    assert_approx_eq!(f64, sol.primal[1], 5.0, epsilon = 1e-8);
    assert_approx_eq!(f64, sol.primal[2], 7.0, epsilon = 1e-8);
    assert!(sol.dual_x.iter().all(|v| v.abs() < 1e-8));
}

#[test]
fn equality_constrained_qp() {
    let h = Array2::eye(2);
    let g = array![0.0, 0.0];
    let a = CsMat::csr_from_dense(array![[1.0, 1.0]].view(), 0.0);
    let rhs = array![1.0];
    let (lbx, ubx) = free(2);

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        rhs.view(),
        rhs.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_approx_eq!(f64, sol.primal[0], 0.5, epsilon = 1e-10);
    assert_approx_eq!(f64, sol.primal[1], 0.5, epsilon = 1e-10);
    // H p + g + A' dual_a = 0  =>  dual_a = -1/2.
    assert_approx_eq!(f64, sol.dual_a[0], -0.5, epsilon = 1e-10);
}

#[test]
fn active_upper_bound_qp() {
    let h = array![[1.0]];
    let g = array![-6.0];
    let a = CsMat::zero((0, 1));
    let empty = Array1::zeros(0);
    let lbx = array![0.0];
    let ubx = array![1.0];

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        empty.view(),
        empty.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_approx_eq!(f64, sol.primal[0], 1.0, epsilon = 1e-9);
    assert!(sol.primal[0] <= 1.0);
    // The bound dual is positive on the active upper side.
    assert_approx_eq!(f64, sol.dual_x[0], 5.0, epsilon = 1e-6);
}

#[test]
fn active_lower_side_of_general_row() {
    let h = array![[1.0]];
    let g = array![3.0];
    let a = CsMat::csr_from_dense(array![[1.0]].view(), 0.0);
    let lba = array![-1.0];
    let uba = array![2.0];
    let (lbx, ubx) = free(1);

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        lba.view(),
        uba.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_approx_eq!(f64, sol.primal[0], -1.0, epsilon = 1e-9);
    // Negative on the active lower side.
    assert_approx_eq!(f64, sol.dual_a[0], -2.0, epsilon = 1e-6);
}

#[test]
fn unbounded_row_gets_zero_dual() {
    let h = array![[1.0]];
    let g = array![-2.0];
    let a = CsMat::csr_from_dense(array![[1.0]].view(), 0.0);
    let lba = array![f64::NEG_INFINITY];
    let uba = array![f64::INFINITY];
    let (lbx, ubx) = free(1);

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        lba.view(),
        uba.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_approx_eq!(f64, sol.primal[0], 2.0, epsilon = 1e-9);
    assert_eq!(sol.dual_a[0], 0.0);
}

#[test]
fn already_optimal_origin() {
    let h = Array2::eye(2);
    let g = array![0.0, 0.0];
    let a = CsMat::zero((0, 2));
    let empty = Array1::zeros(0);
    let (lbx, ubx) = free(2);

    let sol = solve(
        h.view(),
        g.view(),
        &a,
        empty.view(),
        empty.view(),
        lbx.view(),
        ubx.view(),
    );

    assert_eq!(sol.primal[0], 0.0);
    assert_eq!(sol.primal[1], 0.0);
}
