//! This crate solves smooth constrained nonlinear programs (NLPs) by
//! sequential quadratic programming (SQP):
//!
//! ```txt
//!       min F(x)
//!        x
//! ```
//!
//! subject to
//!
//! ```txt
//!       lbg <= g(x) <= ubg    (general nonlinear constraints)
//!       lbx <=  x   <= ubx    (variable bounds)
//! ```
//!
//! At each iterate a convex quadratic subproblem built from the current
//! objective gradient, the constraint linearization and a positive-definite
//! Hessian model is solved for a search direction, which is globalized by a
//! backtracking line search on the l1 exact-penalty merit function. The
//! Hessian model is either a damped BFGS approximation or an exact Hessian
//! of the Lagrangian supplied by the caller.
//!
//! The method follows chapter 18 of
//!
//! >   J. Nocedal and S. J. Wright, "Numerical Optimization", 2nd ed.,
//!     Springer, 2006.
//!     doi: [10.1007/978-0-387-40065-5](https://doi.org/10.1007/978-0-387-40065-5)
//!
//! in particular the merit parameter update (18.36), the Armijo condition
//! on the merit function (18.28) and the damped BFGS update of
//! Procedure 18.2.

mod common;
mod hessian;
mod math;
mod merit;
mod problem;
mod qp;
mod solver;
#[cfg(test)]
mod tests;
mod traits;

pub use common::*;
pub use problem::Nlp;
pub use qp::{DenseIpm, QpProblem, QpSolution};
pub use solver::sqp;
pub use traits::*;
