use ndarray::Array1;

/// Lagrange multiplier estimates on the constraints, blended with the QP
/// duals after every accepted step.
#[derive(Debug, Clone)]
pub struct Multipliers {
    /// Multipliers on the general constraints `g(x)`.
    pub lam: Array1<f64>,
    /// Multipliers on the variable bounds.
    pub lam_x: Array1<f64>,
}

impl Multipliers {
    pub(crate) fn zeros(m: usize, n: usize) -> Self {
        Self {
            lam: Array1::zeros(m),
            lam_x: Array1::zeros(n),
        }
    }
}

/// Hessian model used for the quadratic subproblems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HessianApprox {
    /// Damped BFGS approximation, identity at the first iterate.
    #[default]
    Bfgs,
    /// Exact Hessian of the Lagrangian from the user callback.
    Exact,
}

/// What to do with an initial point that violates the variable bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundPolicy {
    /// Fail with [`SqpError::InitialPointOutOfBounds`].
    #[default]
    Reject,
    /// Project the initial point onto the bounds componentwise.
    Clip,
}

/// Set of diagnostic probes. An enabled probe dumps the corresponding
/// quantity through `log::debug!` each time it is computed. Observational
/// only; the numerics are unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Monitors(u32);

impl Monitors {
    pub const EVAL_F: Monitors = Monitors(1 << 0);
    pub const EVAL_G: Monitors = Monitors(1 << 1);
    pub const EVAL_JAC_G: Monitors = Monitors(1 << 2);
    pub const EVAL_GRAD_F: Monitors = Monitors(1 << 3);
    pub const EVAL_H: Monitors = Monitors(1 << 4);
    pub const QP: Monitors = Monitors(1 << 5);

    pub fn contains(&self, probe: Monitors) -> bool {
        self.0 & probe.0 != 0
    }
}

impl std::ops::BitOr for Monitors {
    type Output = Monitors;

    fn bitor(self, rhs: Monitors) -> Monitors {
        Monitors(self.0 | rhs.0)
    }
}

pub struct Options {
    /// Maximum number of SQP iterations.
    pub maxiter: usize,
    /// Maximum number of line-search backtracking steps.
    pub maxiter_ls: usize,
    /// Termination tolerance on the 2-norm of the step.
    pub toldx: f64,
    /// Termination tolerance on the 2-norm of the Lagrangian gradient.
    pub tolgl: f64,
    /// Weight of the quadratic term in the merit parameter lower bound.
    pub sigma: f64,
    /// Slack in the merit parameter lower bound, 0 < rho < 1.
    pub rho: f64,
    /// Safety factor applied when raising the merit parameter.
    pub mu_safety: f64,
    /// Armijo sufficient-decrease constant, 0 < eta < 1/2.
    pub eta: f64,
    /// Backtracking contraction factor, 0 < tau < 1.
    pub tau: f64,
    /// Hessian model used for the quadratic subproblems.
    pub hessian_approximation: HessianApprox,
    /// Treatment of an out-of-bounds initial point.
    pub bound_policy: BoundPolicy,
    /// Enabled diagnostic probes.
    pub monitor: Monitors,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            maxiter: 100,
            maxiter_ls: 100,
            toldx: 1e-12,
            tolgl: 1e-12,
            sigma: 1.0,
            rho: 0.5,
            mu_safety: 1.1,
            eta: 1e-4,
            tau: 0.2,
            hessian_approximation: HessianApprox::default(),
            bound_policy: BoundPolicy::default(),
            monitor: Monitors::default(),
        }
    }
}

/// How a completed solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The 2-norm of the step fell below `toldx`.
    SmallStep,
    /// The 2-norm of the Lagrangian gradient fell below `tolgl`.
    SmallGrad,
    /// `maxiter` iterations without meeting a tolerance. The last iterate
    /// is still reported as the best known point.
    IterLimit,
    /// The progress monitor requested termination.
    UserStop,
    /// The line search exceeded `maxiter_ls` backtracking steps.
    LineSearchFailed,
    /// The QP subproblem solver reported a failure.
    QpFailure,
}

impl Status {
    /// Whether the solve met one of the two convergence tolerances.
    pub fn converged(&self) -> bool {
        matches!(self, Status::SmallStep | Status::SmallGrad)
    }
}

/// Result of a solve: the last iterate together with how it was reached.
/// On the fatal paths this is attached to the error for diagnosis.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final primal iterate.
    pub x: Array1<f64>,
    /// Objective value at `x`.
    pub cost: f64,
    /// Number of SQP iterations performed.
    pub iterations: usize,
    /// Final multiplier estimates.
    pub multipliers: Multipliers,
    pub status: Status,
}

/// Per-iteration diagnostics handed to the progress monitor and written to
/// the iteration log.
#[derive(Debug, Clone, Copy)]
pub struct IterStats {
    /// Iteration number, starting at 1.
    pub iter: usize,
    /// Backtracking steps taken by the line search this iteration.
    pub lsiter: usize,
    /// 2-norm of the accepted step.
    pub normdx: f64,
    /// 2-norm of the Lagrangian gradient.
    pub normgradl: f64,
    /// 1-norm of the constraint violations used in the merit function.
    pub eq_viol: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SqpError {
    #[error("hessian_approximation is Exact but no Hessian callback was supplied")]
    MissingHessian,
    #[error("x0[{index}] = {value} violates the variable bounds [{lower}, {upper}]")]
    InitialPointOutOfBounds {
        index: usize,
        value: f64,
        lower: f64,
        upper: f64,
    },
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
    #[error("line search failed to find an acceptable step")]
    LineSearchFailed {
        /// The last accepted iterate.
        last: Box<Solution>,
    },
    #[error("QP subproblem failed: {source}")]
    QpFailure {
        /// The last accepted iterate.
        last: Box<Solution>,
        #[source]
        source: anyhow::Error,
    },
}
