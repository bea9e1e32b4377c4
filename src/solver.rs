use crate::common::{
    HessianApprox, IterStats, Monitors, Multipliers, Options, Solution, SqpError, Status,
};
use crate::hessian::damped_bfgs;
use crate::merit::{backtrack, L1Merit};
use crate::problem::Nlp;
use crate::qp::{DenseIpm, QpProblem};
use crate::traits::{Norm, NormL1, ProgressMonitor, QpSolver};
use ndarray::{Array1, Array2, ArrayView1};
use sprs::CsMat;

/// Solves `nlp` by sequential quadratic programming from the starting
/// point `x0`.
///
/// Each iteration linearizes the constraints around the current iterate,
/// minimizes a quadratic model of the objective over the feasible step
/// set, and globalizes the resulting direction with a backtracking line
/// search on the l1 exact-penalty merit function. The multiplier
/// estimates are blended with the QP duals in proportion to the accepted
/// step size.
///
/// `qp_solver` defaults to [`DenseIpm`]. `progress`, when given, is
/// invoked once per iteration and may request early termination.
///
/// On the `Ok` path the returned [`Solution`] carries a [`Status`]
/// describing how the solve ended; `IterLimit` is a normal
/// non-convergence return reporting the last iterate as the best known
/// point. Fatal conditions come back as [`SqpError`] with the last
/// accepted iterate attached for diagnosis.
pub fn sqp(
    nlp: &Nlp,
    x0: ArrayView1<f64>,
    qp_solver: Option<&dyn QpSolver>,
    opt: &Options,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<Solution, SqpError> {
    if !(opt.rho > 0.0 && opt.rho < 1.0) {
        return Err(SqpError::InvalidOption("rho must be in (0, 1)"));
    }
    if !(opt.eta > 0.0 && opt.eta < 0.5) {
        return Err(SqpError::InvalidOption("eta must be in (0, 1/2)"));
    }
    if !(opt.tau > 0.0 && opt.tau < 1.0) {
        return Err(SqpError::InvalidOption("tau must be in (0, 1)"));
    }
    if opt.sigma < 0.0 {
        return Err(SqpError::InvalidOption("sigma must be non-negative"));
    }
    if opt.hessian_approximation == HessianApprox::Exact && nlp.hessian.is_none() {
        return Err(SqpError::MissingHessian);
    }

    let n = x0.len();
    let m = nlp.m();
    let (lbx, ubx) = nlp.var_bounds(n);
    let mut x = nlp.accept_x0(x0, &lbx, &ubx, opt.bound_policy)?;

    let default_qp = DenseIpm::default();
    let qp_solver = qp_solver.unwrap_or(&default_qp);

    let mut mult = Multipliers::zeros(m, n);
    let mut bk = Array2::<f64>::eye(n);
    let mut merit = L1Merit::new();

    // Evaluate the problem functions at the initial point; subsequent
    // iterations reuse the post-step evaluation.
    let (mut gk, mut jgk) = nlp.eval_g_jac(x.view());
    let (mut fk, mut gfk) = nlp.eval_f_grad(x.view());
    dump_evals(opt, x.view(), fk, &gfk, &gk, &jgk);

    if opt.hessian_approximation == HessianApprox::Exact {
        bk = nlp.eval_h(x.view(), mult.lam.view());
        if opt.monitor.contains(Monitors::EVAL_H) {
            log::debug!("(init) B = {bk}");
        }
    }

    log::info!(" iter       objective  nls        normdx     normgradL       eq_viol");

    let mut k = 0;
    loop {
        // Quadratic subproblem at the current iterate: minimize the model
        // over steps keeping the linearized constraints and the shifted
        // variable bounds feasible.
        let lba = &nlp.lbg - &gk;
        let uba = &nlp.ubg - &gk;
        let lbp = &lbx - &x;
        let ubp = &ubx - &x;
        let qp = QpProblem {
            h: bk.view(),
            g: gfk.view(),
            a: jgk.view(),
            lba: lba.view(),
            uba: uba.view(),
            lbx: lbp.view(),
            ubx: ubp.view(),
        };
        if opt.monitor.contains(Monitors::QP) {
            log::debug!("(qp) H = {bk}");
            log::debug!("(qp) G = {gfk}");
            log::debug!("(qp) A = {jgk:?}");
            log::debug!("(qp) LBA = {lba}, UBA = {uba}");
            log::debug!("(qp) LBX = {lbp}, UBX = {ubp}");
        }
        let qsol = match qp_solver.solve(&qp) {
            Ok(qsol) => qsol,
            Err(source) => {
                return Err(SqpError::QpFailure {
                    last: Box::new(Solution {
                        x,
                        cost: fk,
                        iterations: k,
                        multipliers: mult,
                        status: Status::QpFailure,
                    }),
                    source,
                })
            }
        };
        let (p, lam_hat, lam_x_hat) = (qsol.primal, qsol.dual_a, qsol.dual_x);

        // Gradient of the Lagrangian at the current iterate, with the QP
        // dual estimates.
        let jtl = if m > 0 {
            &jgk.transpose_view() * &lam_hat.view()
        } else {
            Array1::zeros(n)
        };
        let gradl = &gfk - &jtl - &lam_x_hat;

        // Merit parameter update and line search along p.
        let feasviol = gk.norm_l1();
        let gfp = gfk.dot(&p);
        let pbp = p.dot(&bk.dot(&p));
        merit.update_mu(gfp, pbp, feasviol, opt);
        let t1 = merit.value(fk, feasviol);
        let dt1 = merit.deriv(gfp, feasviol);

        let ls = match backtrack(nlp, &x, &p, t1, dt1, &merit, opt) {
            Some(ls) => ls,
            None => {
                return Err(SqpError::LineSearchFailed {
                    last: Box::new(Solution {
                        x,
                        cost: fk,
                        iterations: k,
                        multipliers: mult,
                        status: Status::LineSearchFailed,
                    }),
                })
            }
        };

        // Step, and blend the multiplier estimates with the QP duals.
        let dx = ls.alpha * &p;
        x = ls.x_new;
        mult.lam = blend(ls.alpha, &lam_hat, &mult.lam);
        mult.lam_x = blend(ls.alpha, &lam_x_hat, &mult.lam_x);
        k += 1;

        let normdx = dx.norm();
        let normgradl = gradl.norm();
        let stats = IterStats {
            iter: k,
            lsiter: ls.lsiter,
            normdx,
            normgradl,
            eq_viol: feasviol,
        };
        log::info!(
            "{:5} {:15.6e} {:4} {:13.4e} {:13.4e} {:13.4e}",
            k,
            ls.f_new,
            ls.lsiter,
            normdx,
            normgradl,
            feasviol
        );
        if let Some(progress) = progress {
            if progress.update(&stats, x.view(), ls.f_new) {
                return Ok(Solution {
                    x,
                    cost: ls.f_new,
                    iterations: k,
                    multipliers: mult,
                    status: Status::UserStop,
                });
            }
        }

        // Termination tests.
        if normdx < opt.toldx {
            return Ok(Solution {
                x,
                cost: ls.f_new,
                iterations: k,
                multipliers: mult,
                status: Status::SmallStep,
            });
        }
        if normgradl < opt.tolgl {
            return Ok(Solution {
                x,
                cost: ls.f_new,
                iterations: k,
                multipliers: mult,
                status: Status::SmallGrad,
            });
        }
        if k >= opt.maxiter {
            return Ok(Solution {
                x,
                cost: ls.f_new,
                iterations: k,
                multipliers: mult,
                status: Status::IterLimit,
            });
        }

        // Re-evaluate at the new iterate; feeds the Hessian update and
        // the next iteration.
        let (g_new, jg_new) = nlp.eval_g_jac(x.view());
        let (f_new, gf_new) = nlp.eval_f_grad(x.view());
        dump_evals(opt, x.view(), f_new, &gf_new, &g_new, &jg_new);

        match opt.hessian_approximation {
            HessianApprox::Exact => {
                bk = nlp.eval_h(x.view(), mult.lam.view());
            }
            HessianApprox::Bfgs => {
                // Change of the Lagrangian gradient across the step, with
                // the blended multipliers at the new iterate.
                let jtl_new = if m > 0 {
                    &jg_new.transpose_view() * &mult.lam.view()
                } else {
                    Array1::zeros(n)
                };
                let gradl_new = &gf_new - &jtl_new - &mult.lam_x;
                let yk = &gradl_new - &gradl;
                damped_bfgs(&mut bk, &dx, &yk);
            }
        }
        if opt.monitor.contains(Monitors::EVAL_H) {
            log::debug!("(iter {k}) B = {bk}");
        }

        gk = g_new;
        jgk = jg_new;
        fk = f_new;
        gfk = gf_new;
    }
}

/// Step-scaled convex combination of the previous multiplier estimate
/// with the QP dual.
pub(crate) fn blend(alpha: f64, hat: &Array1<f64>, old: &Array1<f64>) -> Array1<f64> {
    alpha * hat + (1.0 - alpha) * old
}

fn dump_evals(
    opt: &Options,
    x: ArrayView1<f64>,
    fk: f64,
    gfk: &Array1<f64>,
    gk: &Array1<f64>,
    jgk: &CsMat<f64>,
) {
    if opt.monitor.contains(Monitors::EVAL_F) {
        log::debug!("(main loop) x = {x}, f = {fk:e}");
    }
    if opt.monitor.contains(Monitors::EVAL_GRAD_F) {
        log::debug!("(main loop) gradF = {gfk}");
    }
    if opt.monitor.contains(Monitors::EVAL_G) {
        log::debug!("(main loop) g = {gk}");
    }
    if opt.monitor.contains(Monitors::EVAL_JAC_G) {
        log::debug!("(main loop) J = {jgk:?}");
    }
}
