use crate::math::outer;
use ndarray::{Array1, Array2};

/// Damped BFGS update of the Hessian approximation (Procedure 18.2 of
/// Nocedal & Wright). `dx` is the accepted step and `yk` the change of the
/// Lagrangian gradient across it; `yk` is replaced by the damped blend
///
/// ```txt
///       rk = theta * yk + (1 - theta) * B dx
/// ```
///
/// which keeps the curvature along the step at least 0.2 * dx'B dx, so a
/// positive-definite `b` stays positive-definite. When the curvature
/// products break down in floating point the update is skipped and `b` is
/// retained unchanged.
pub(crate) fn damped_bfgs(b: &mut Array2<f64>, dx: &Array1<f64>, yk: &Array1<f64>) {
    let bdx = b.dot(dx);
    let dxbdx = dx.dot(&bdx);
    let ydx = dx.dot(yk);

    if dxbdx <= 0.0 || !dxbdx.is_finite() {
        return;
    }

    let theta = if ydx >= 0.2 * dxbdx {
        1.0
    } else {
        0.8 * dxbdx / (dxbdx - ydx)
    };
    let rk = theta * yk + (1.0 - theta) * &bdx;

    let rdx = rk.dot(dx);
    if rdx <= 0.0 || !rdx.is_finite() {
        return;
    }

    *b -= &(outer(bdx.view(), bdx.view()) / dxbdx);
    *b += &(outer(rk.view(), rk.view()) / rdx);
}
