use crate::common::IterStats;
use crate::qp::{QpProblem, QpSolution};
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1};
use sprs::CsMat;

/// Objective callback `F`.
pub trait Objective {
    /// Evaluates `f(x)` and, when `gradient` is set, the total derivative
    /// `grad f(x)` (the adjoint of a reverse pass with unit seed). `p` is
    /// the static parameter vector, empty when the problem has none.
    fn eval(
        &self,
        x: ArrayView1<f64>,
        p: ArrayView1<f64>,
        gradient: bool,
    ) -> (f64, Option<Array1<f64>>);
}

/// Constraint callback `G` with its Jacobian `J`.
pub trait Constraint {
    /// Number of constraint components m.
    fn dim(&self) -> usize;

    /// Evaluates `g(x)` and, when `jacobian` is set, the m-by-n Jacobian.
    /// The sparsity pattern of the Jacobian must not change between calls.
    fn eval(
        &self,
        x: ArrayView1<f64>,
        p: ArrayView1<f64>,
        jacobian: bool,
    ) -> (Array1<f64>, Option<CsMat<f64>>);
}

/// Exact Hessian callback `H`.
pub trait LagrangianHessian {
    /// Evaluates the Hessian of the Lagrangian at `(x, lam)`, scaled by
    /// `sigma`. The solver always passes `sigma = 1`. Callbacks whose
    /// Hessian does not depend on the multipliers simply ignore `lam`.
    fn eval(
        &self,
        x: ArrayView1<f64>,
        lam: ArrayView1<f64>,
        sigma: f64,
        p: ArrayView1<f64>,
    ) -> Array2<f64>;
}

/// The quadratic subproblem solver. [`crate::DenseIpm`] is the bundled
/// implementation; any solver honoring the [`QpProblem`] contract and the
/// dual sign convention documented there can be substituted.
pub trait QpSolver {
    fn solve(&self, qp: &QpProblem) -> Result<QpSolution>;
}

/// Called on each iteration of the solver with the iteration statistics,
/// the current iterate and the current objective value. Returning `true`
/// requests early termination.
pub trait ProgressMonitor {
    fn update(&self, stats: &IterStats, x: ArrayView1<f64>, cost: f64) -> bool;
}

pub(crate) trait Norm {
    /// Returns the 2-norm (Euclidean) of a.
    fn norm(&self) -> f64;
}

impl Norm for Array1<f64> {
    fn norm(&self) -> f64 {
        self.iter().map(|&v| v * v).sum::<f64>().sqrt()
    }
}

impl Norm for ArrayView1<'_, f64> {
    fn norm(&self) -> f64 {
        self.iter().map(|&v| v * v).sum::<f64>().sqrt()
    }
}

pub(crate) trait NormInf {
    fn norm_inf(&self) -> f64;
}

impl NormInf for Array1<f64> {
    fn norm_inf(&self) -> f64 {
        self.iter().fold(0.0, |m, &v| v.abs().max(m))
    }
}

impl NormInf for ArrayView1<'_, f64> {
    fn norm_inf(&self) -> f64 {
        self.iter().fold(0.0, |m, &v| v.abs().max(m))
    }
}

pub(crate) trait NormL1 {
    fn norm_l1(&self) -> f64;
}

impl NormL1 for Array1<f64> {
    fn norm_l1(&self) -> f64 {
        self.iter().map(|v| v.abs()).sum()
    }
}
