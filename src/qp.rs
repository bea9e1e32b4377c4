use crate::math::{chol_solve, cholesky, lu_solve};
use crate::traits::{NormInf, QpSolver};
use anyhow::{bail, Result};
use itertools::izip;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use sprs::CsMatView;

/// One quadratic subproblem,
///
/// ```txt
///       min 1/2 p'Hp + g'p
///        p
/// ```
///
/// subject to
///
/// ```txt
///       lba <= A*p <= uba    (general constraints)
///       lbx <=  p  <= ubx    (bounds)
/// ```
///
/// `h` is dense symmetric positive-definite; `a` may be sparse and has
/// zero rows (with empty `lba`/`uba`) when there are no general
/// constraints. Infinite bound entries mean the respective side is
/// unconstrained; `lba[i] == uba[i]` marks an equality row.
pub struct QpProblem<'a> {
    pub h: ArrayView2<'a, f64>,
    pub g: ArrayView1<'a, f64>,
    pub a: CsMatView<'a, f64>,
    pub lba: ArrayView1<'a, f64>,
    pub uba: ArrayView1<'a, f64>,
    pub lbx: ArrayView1<'a, f64>,
    pub ubx: ArrayView1<'a, f64>,
}

/// Primal and dual solution of a [`QpProblem`]. The duals satisfy the
/// stationarity convention
///
/// ```txt
///       H p + g + A' dual_a + dual_x = 0
/// ```
///
/// so a dual is non-negative on an active upper side and non-positive on
/// an active lower side. Rows with both bounds infinite get a zero dual.
pub struct QpSolution {
    pub primal: Array1<f64>,
    pub dual_a: Array1<f64>,
    pub dual_x: Array1<f64>,
}

/// Where a split row came from, for scattering the duals back.
#[derive(Clone, Copy)]
enum Target {
    General(usize),
    Bound(usize),
}

struct EqRow {
    row: Array1<f64>,
    rhs: f64,
    target: Target,
}

/// One-sided row `row'p - rhs <= 0`; `sign` is the factor its multiplier
/// carries into the dual of the original two-sided row.
struct IneqRow {
    row: Array1<f64>,
    rhs: f64,
    target: Target,
    sign: f64,
}

fn split_row(
    row: Array1<f64>,
    lower: f64,
    upper: f64,
    target: Target,
    eq: &mut Vec<EqRow>,
    ineq: &mut Vec<IneqRow>,
) {
    if lower == f64::NEG_INFINITY && upper == f64::INFINITY {
        return;
    }
    if (upper - lower).abs() <= f64::EPSILON {
        eq.push(EqRow {
            row,
            rhs: upper,
            target,
        });
        return;
    }
    if upper.is_finite() {
        ineq.push(IneqRow {
            row: row.clone(),
            rhs: upper,
            target,
            sign: 1.0,
        });
    }
    if lower.is_finite() {
        ineq.push(IneqRow {
            row: -row,
            rhs: -lower,
            target,
            sign: -1.0,
        });
    }
}

/// Largest fraction of the full Newton step keeping `v + alpha*dv`
/// strictly positive, scaled by `xi` and capped at 1.
fn step_scale(v: &Array1<f64>, dv: &Array1<f64>, xi: f64) -> f64 {
    let mut alpha = 1.0f64;
    for (&vi, &dvi) in izip!(v.iter(), dv.iter()) {
        if dvi < 0.0 {
            alpha = alpha.min(xi * (vi / -dvi));
        }
    }
    alpha
}

/// Dense primal-dual interior point solver for strictly convex quadratic
/// programs, the bundled [`QpSolver`] implementation.
///
/// Two-sided rows (general constraints and bounds alike) are split into an
/// equality set and one-sided inequality rows with slacks `z > 0` and
/// multipliers `mu >= 0`. Newton directions for the perturbed KKT
/// conditions are computed from a dense reduced system, primal and dual
/// steps are clipped to keep `z` and `mu` strictly positive, and the
/// barrier coefficient is re-centered from the complementarity gap after
/// every step.
pub struct DenseIpm {
    /// Termination tolerance for the feasibility condition.
    pub feas_tol: f64,
    /// Termination tolerance for the gradient condition.
    pub grad_tol: f64,
    /// Termination tolerance for the complementarity condition.
    pub comp_tol: f64,
    /// Maximum number of interior-point iterations.
    pub max_it: usize,
    /// Fraction of the distance to the boundary taken by a step.
    pub xi: f64,
    /// Centering parameter for the barrier update.
    pub sigma: f64,
    /// Initialization of slack variables and inequality multipliers.
    pub z0: f64,
}

impl Default for DenseIpm {
    fn default() -> Self {
        Self {
            feas_tol: 1e-12,
            grad_tol: 1e-12,
            comp_tol: 1e-12,
            max_it: 200,
            xi: 0.99995,
            sigma: 0.1,
            z0: 1.0,
        }
    }
}

impl QpSolver for DenseIpm {
    fn solve(&self, qp: &QpProblem) -> Result<QpSolution> {
        let n = qp.g.len();
        let ma = qp.a.rows();
        debug_assert_eq!(qp.h.nrows(), n);
        debug_assert_eq!(qp.h.ncols(), n);
        debug_assert_eq!(qp.a.cols(), n);
        debug_assert_eq!(qp.lba.len(), ma);
        debug_assert_eq!(qp.uba.len(), ma);
        debug_assert_eq!(qp.lbx.len(), n);
        debug_assert_eq!(qp.ubx.len(), n);

        // Densify the general rows; the Hessian is dense anyway and the
        // reduced KKT systems below are dense.
        let a_csr = qp.a.to_csr();
        let mut a_dense = Array2::<f64>::zeros((ma, n));
        for (i, row) in a_csr.outer_iterator().enumerate() {
            for (j, &v) in row.iter() {
                a_dense[[i, j]] = v;
            }
        }

        // Split the two-sided rows into an equality set and one-sided
        // inequality rows.
        let mut eq = Vec::<EqRow>::new();
        let mut ineq = Vec::<IneqRow>::new();
        for (i, (&l, &u)) in izip!(qp.lba.iter(), qp.uba.iter()).enumerate() {
            split_row(
                a_dense.row(i).to_owned(),
                l,
                u,
                Target::General(i),
                &mut eq,
                &mut ineq,
            );
        }
        for (j, (&l, &u)) in izip!(qp.lbx.iter(), qp.ubx.iter()).enumerate() {
            let mut row = Array1::<f64>::zeros(n);
            row[j] = 1.0;
            split_row(row, l, u, Target::Bound(j), &mut eq, &mut ineq);
        }
        let ne = eq.len();
        let ni = ineq.len();

        let mut ae_mat = Array2::<f64>::zeros((ne, n));
        let mut be = Array1::<f64>::zeros(ne);
        for (k, r) in eq.iter().enumerate() {
            ae_mat.row_mut(k).assign(&r.row);
            be[k] = r.rhs;
        }
        let mut ai_mat = Array2::<f64>::zeros((ni, n));
        let mut bi = Array1::<f64>::zeros(ni);
        for (k, r) in ineq.iter().enumerate() {
            ai_mat.row_mut(k).assign(&r.row);
            bi[k] = r.rhs;
        }

        // Initialize the interior point: p = 0, slacks and multipliers
        // pushed away from the boundary.
        let mut p = Array1::<f64>::zeros(n);
        let mut lam = Array1::<f64>::zeros(ne);
        let mut hk = -&bi;
        let mut gamma = 1.0;
        let z0 = self.z0;
        let mut z: Array1<f64> = hk.mapv(|hi| if -hi > z0 { -hi } else { z0 });
        let mut mu: Array1<f64> = z.mapv(|zk| if gamma / zk > z0 { gamma / zk } else { z0 });

        let mut it = 0;
        loop {
            let df = qp.h.dot(&p) + &qp.g;
            let mut lx = df;
            if ne > 0 {
                lx = lx + ae_mat.t().dot(&lam);
            }
            if ni > 0 {
                lx = lx + ai_mat.t().dot(&mu);
            }
            let ge = if ne > 0 {
                ae_mat.dot(&p) - &be
            } else {
                Array1::zeros(0)
            };
            let maxh = hk.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));

            let viol = if ni > 0 {
                ge.norm_inf().max(maxh)
            } else {
                ge.norm_inf()
            };
            let feascond = viol / (1.0 + p.norm_inf().max(z.norm_inf()));
            let gradcond = lx.norm_inf()
                / (1.0 + qp.g.norm_inf().max(lam.norm_inf()).max(mu.norm_inf()));
            let compcond = z.dot(&mu) / (1.0 + p.norm_inf());

            if feascond < self.feas_tol && gradcond < self.grad_tol && compcond < self.comp_tol {
                break;
            }
            if it >= self.max_it {
                bail!("interior point method did not converge in {it} iterations");
            }
            it += 1;

            // Newton direction from the reduced KKT system: inequalities
            // are condensed into M and the equality block is bordered.
            let zinv = z.mapv(f64::recip);
            let m_mat = if ni > 0 {
                let mut wai = ai_mat.clone();
                for (r, mut row) in wai.outer_iter_mut().enumerate() {
                    row *= mu[r] * zinv[r];
                }
                qp.h.to_owned() + ai_mat.t().dot(&wai)
            } else {
                qp.h.to_owned()
            };
            let n_vec = if ni > 0 {
                let w: Array1<f64> = izip!(zinv.iter(), mu.iter(), hk.iter())
                    .map(|(&zi, &mi, &hi)| zi * (mi * hi + gamma))
                    .collect();
                &lx + &ai_mat.t().dot(&w)
            } else {
                lx.clone()
            };

            let (dp, dlam) = if ne == 0 {
                let l = match cholesky(&m_mat) {
                    Some(l) => l,
                    None => bail!("reduced KKT matrix is not positive definite"),
                };
                (chol_solve(&l, &(-&n_vec)), Array1::zeros(0))
            } else {
                let dim = n + ne;
                let mut kkt = Array2::<f64>::zeros((dim, dim));
                kkt.slice_mut(s![..n, ..n]).assign(&m_mat);
                kkt.slice_mut(s![..n, n..]).assign(&ae_mat.t());
                kkt.slice_mut(s![n.., ..n]).assign(&ae_mat);
                let mut rhs = Array1::<f64>::zeros(dim);
                rhs.slice_mut(s![..n]).assign(&(-&n_vec));
                rhs.slice_mut(s![n..]).assign(&(-&ge));
                match lu_solve(&kkt, &rhs) {
                    Some(sol) => (sol.slice(s![..n]).to_owned(), sol.slice(s![n..]).to_owned()),
                    None => bail!("KKT system is singular"),
                }
            };

            let (dz, dmu) = if ni > 0 {
                let dz = -&hk - &z - &ai_mat.dot(&dp);
                let dmu: Array1<f64> = izip!(mu.iter(), zinv.iter(), dz.iter())
                    .map(|(&mi, &zi, &dzi)| -mi + zi * (gamma - mi * dzi))
                    .collect();
                (dz, dmu)
            } else {
                (Array1::zeros(0), Array1::zeros(0))
            };

            let alphap = step_scale(&z, &dz, self.xi);
            let alphad = step_scale(&mu, &dmu, self.xi);

            p = p + alphap * &dp;
            z = z + alphap * &dz;
            lam = lam + alphad * &dlam;
            mu = mu + alphad * &dmu;

            if p.iter().any(|v| !v.is_finite())
                || lam.iter().any(|v| !v.is_finite())
                || mu.iter().any(|v| !v.is_finite())
            {
                bail!("interior point iteration became non-finite");
            }

            if ni > 0 {
                hk = ai_mat.dot(&p) - &bi;
                gamma = self.sigma * z.dot(&mu) / ni as f64;
            }
        }

        // Scatter the multipliers of the split rows back onto the original
        // two-sided rows, in the documented sign convention.
        let mut dual_a = Array1::<f64>::zeros(ma);
        let mut dual_x = Array1::<f64>::zeros(n);
        for (k, r) in eq.iter().enumerate() {
            match r.target {
                Target::General(i) => dual_a[i] += lam[k],
                Target::Bound(j) => dual_x[j] += lam[k],
            }
        }
        for (k, r) in ineq.iter().enumerate() {
            match r.target {
                Target::General(i) => dual_a[i] += r.sign * mu[k],
                Target::Bound(j) => dual_x[j] += r.sign * mu[k],
            }
        }

        Ok(QpSolution {
            primal: p,
            dual_a,
            dual_x,
        })
    }
}
