use crate::common::{BoundPolicy, SqpError};
use crate::traits::{Constraint, LagrangianHessian, Objective};
use itertools::izip;
use ndarray::{Array1, Array2, ArrayView1};
use sprs::CsMat;

/// A smooth constrained nonlinear program, binding the user callbacks to
/// the bounds and the static parameter:
///
/// ```txt
///       min F(x)    s.t.  lbg <= g(x) <= ubg,  lbx <= x <= ubx
/// ```
///
/// Only the objective is mandatory. A problem without a constraint
/// callback is unconstrained (m = 0); absent bounds are unbounded.
pub struct Nlp<'a> {
    pub(crate) objective: &'a dyn Objective,
    pub(crate) constraint: Option<&'a dyn Constraint>,
    pub(crate) hessian: Option<&'a dyn LagrangianHessian>,
    pub(crate) lbx: Option<Array1<f64>>,
    pub(crate) ubx: Option<Array1<f64>>,
    pub(crate) lbg: Array1<f64>,
    pub(crate) ubg: Array1<f64>,
    pub(crate) param: Array1<f64>,
}

impl<'a> Nlp<'a> {
    pub fn new(objective: &'a dyn Objective) -> Self {
        Self {
            objective,
            constraint: None,
            hessian: None,
            lbx: None,
            ubx: None,
            lbg: Array1::zeros(0),
            ubg: Array1::zeros(0),
            param: Array1::zeros(0),
        }
    }

    /// Adds the constraint callback together with its bounds. An equality
    /// component i is expressed as `lbg[i] == ubg[i]`.
    pub fn with_constraint(
        mut self,
        constraint: &'a dyn Constraint,
        lbg: Array1<f64>,
        ubg: Array1<f64>,
    ) -> Self {
        assert_eq!(lbg.len(), constraint.dim(), "lbg length mismatch");
        assert_eq!(ubg.len(), constraint.dim(), "ubg length mismatch");
        self.constraint = Some(constraint);
        self.lbg = lbg;
        self.ubg = ubg;
        self
    }

    /// Adds variable bounds.
    pub fn with_bounds(mut self, lbx: Array1<f64>, ubx: Array1<f64>) -> Self {
        self.lbx = Some(lbx);
        self.ubx = Some(ubx);
        self
    }

    /// Adds the exact-Hessian callback, required for
    /// [`crate::HessianApprox::Exact`].
    pub fn with_hessian(mut self, hessian: &'a dyn LagrangianHessian) -> Self {
        self.hessian = Some(hessian);
        self
    }

    /// Sets the static parameter forwarded to every callback.
    pub fn with_param(mut self, param: Array1<f64>) -> Self {
        self.param = param;
        self
    }

    /// Number of general constraint components.
    pub(crate) fn m(&self) -> usize {
        self.constraint.map_or(0, |c| c.dim())
    }

    /// Variable bounds, unbounded by default.
    pub(crate) fn var_bounds(&self, n: usize) -> (Array1<f64>, Array1<f64>) {
        let lbx = match &self.lbx {
            Some(lbx) => lbx.to_owned(),
            None => Array1::from_elem(n, f64::NEG_INFINITY),
        };
        let ubx = match &self.ubx {
            Some(ubx) => ubx.to_owned(),
            None => Array1::from_elem(n, f64::INFINITY),
        };
        assert_eq!(lbx.len(), n, "lbx length mismatch");
        assert_eq!(ubx.len(), n, "ubx length mismatch");
        (lbx, ubx)
    }

    /// Validates the initial point against the variable bounds, rejecting
    /// or clipping per `policy`.
    pub(crate) fn accept_x0(
        &self,
        x0: ArrayView1<f64>,
        lbx: &Array1<f64>,
        ubx: &Array1<f64>,
        policy: BoundPolicy,
    ) -> Result<Array1<f64>, SqpError> {
        match policy {
            BoundPolicy::Reject => {
                for (index, (&value, &lower, &upper)) in
                    izip!(x0.iter(), lbx.iter(), ubx.iter()).enumerate()
                {
                    if value < lower || value > upper {
                        return Err(SqpError::InitialPointOutOfBounds {
                            index,
                            value,
                            lower,
                            upper,
                        });
                    }
                }
                Ok(x0.to_owned())
            }
            BoundPolicy::Clip => Ok(izip!(x0.iter(), lbx.iter(), ubx.iter())
                .map(|(&v, &l, &u)| v.max(l).min(u))
                .collect()),
        }
    }

    pub(crate) fn eval_f(&self, x: ArrayView1<f64>) -> f64 {
        self.objective.eval(x, self.param.view(), false).0
    }

    pub(crate) fn eval_f_grad(&self, x: ArrayView1<f64>) -> (f64, Array1<f64>) {
        let (f, df) = self.objective.eval(x, self.param.view(), true);
        (f, df.expect("objective gradient requested but not returned"))
    }

    pub(crate) fn eval_g(&self, x: ArrayView1<f64>) -> Array1<f64> {
        match self.constraint {
            Some(c) => c.eval(x, self.param.view(), false).0,
            None => Array1::zeros(0),
        }
    }

    pub(crate) fn eval_g_jac(&self, x: ArrayView1<f64>) -> (Array1<f64>, CsMat<f64>) {
        match self.constraint {
            Some(c) => {
                let (g, jg) = c.eval(x, self.param.view(), true);
                (
                    g,
                    jg.expect("constraint Jacobian requested but not returned"),
                )
            }
            None => (Array1::zeros(0), CsMat::zero((0, x.len()))),
        }
    }

    pub(crate) fn eval_h(&self, x: ArrayView1<f64>, lam: ArrayView1<f64>) -> Array2<f64> {
        self.hessian
            .expect("hessian callback checked at solve entry")
            .eval(x, lam, 1.0, self.param.view())
    }
}
