use crate::common::{Monitors, Options};
use crate::problem::Nlp;
use crate::traits::NormL1;
use ndarray::Array1;

/// State of the l1 exact-penalty merit function
///
/// ```txt
///       T1(x; mu) = f(x) + mu * sum |g(x)|
/// ```
///
/// The penalty weight starts at zero and is only ever raised, once per
/// iteration, to keep the search direction a sufficient-descent direction
/// for T1.
pub(crate) struct L1Merit {
    pub mu: f64,
}

impl L1Merit {
    pub fn new() -> Self {
        Self { mu: 0.0 }
    }

    /// Raises `mu` when it falls below the lower bound obtained from a
    /// quadratic model of T1 (eq. 18.36 in Nocedal & Wright),
    ///
    /// ```txt
    ///       mu_lb = (gf'p + sigma/2 p'Bp) / ((1 - rho) * feasviol)
    /// ```
    ///
    /// Skipped when `feasviol` is zero; the previous weight carries over.
    pub fn update_mu(&mut self, gfp: f64, pbp: f64, feasviol: f64, opt: &Options) {
        if feasviol == 0.0 {
            return;
        }
        let mu_lb = (gfp + 0.5 * opt.sigma * pbp) / ((1.0 - opt.rho) * feasviol);
        if self.mu < mu_lb {
            self.mu = opt.mu_safety * mu_lb;
        }
    }

    /// T1 at an iterate with objective `fk` and violation `feasviol`
    /// (18.27 in Nocedal & Wright).
    pub fn value(&self, fk: f64, feasviol: f64) -> f64 {
        fk + self.mu * feasviol
    }

    /// Directional derivative of T1 along the search direction
    /// (cf. 18.29 in Nocedal & Wright).
    pub fn deriv(&self, gfp: f64, feasviol: f64) -> f64 {
        gfp - self.mu * feasviol
    }
}

/// Outcome of an accepted backtracking line search.
pub(crate) struct LineSearch {
    pub alpha: f64,
    pub lsiter: usize,
    pub x_new: Array1<f64>,
    pub f_new: f64,
}

/// Armijo backtracking on the merit function along `p`, starting from a
/// full step (18.28 in Nocedal & Wright). Returns `None` when no step is
/// accepted within `maxiter_ls`. A non-finite trial value fails the test
/// like any other insufficient decrease and backtracking continues.
pub(crate) fn backtrack(
    nlp: &Nlp,
    x: &Array1<f64>,
    p: &Array1<f64>,
    t1: f64,
    dt1: f64,
    merit: &L1Merit,
    opt: &Options,
) -> Option<LineSearch> {
    let mut alpha = 1.0;
    let mut lsiter = 0;

    loop {
        let x_new: Array1<f64> = x + &(alpha * p);
        let f_new = nlp.eval_f(x_new.view());
        if opt.monitor.contains(Monitors::EVAL_F) {
            log::debug!("(line search) x = {x_new}, f = {f_new:e}");
        }

        let g_new = nlp.eval_g(x_new.view());
        if opt.monitor.contains(Monitors::EVAL_G) {
            log::debug!("(line search) g = {g_new}");
        }
        let t1_new = merit.value(f_new, g_new.norm_l1());

        if t1_new <= t1 + opt.eta * alpha * dt1 {
            return Some(LineSearch {
                alpha,
                lsiter,
                x_new,
                f_new,
            });
        }

        alpha *= opt.tau;
        lsiter += 1;
        if lsiter >= opt.maxiter_ls {
            return None;
        }
    }
}
