use ndarray::{Array1, Array2, ArrayView1};

/// Computes the outer product `a * b'`.
pub(crate) fn outer(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Solves the dense system `A x = b` by LU factorization with partial
/// pivoting. Returns `None` when a pivot is zero or non-finite.
pub(crate) fn lu_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(b.len(), n);

    let mut lu = a.to_owned();
    let mut x = b.to_owned();

    for k in 0..n {
        let mut piv = k;
        let mut pmax = lu[[k, k]].abs();
        for i in k + 1..n {
            let v = lu[[i, k]].abs();
            if v > pmax {
                piv = i;
                pmax = v;
            }
        }
        if pmax == 0.0 || !pmax.is_finite() {
            return None;
        }
        if piv != k {
            for j in 0..n {
                lu.swap([k, j], [piv, j]);
            }
            x.swap(k, piv);
        }
        for i in k + 1..n {
            let l = lu[[i, k]] / lu[[k, k]];
            lu[[i, k]] = l;
            for j in k + 1..n {
                lu[[i, j]] -= l * lu[[k, j]];
            }
            x[i] -= l * x[k];
        }
    }

    for i in (0..n).rev() {
        let mut s = x[i];
        for j in i + 1..n {
            s -= lu[[i, j]] * x[j];
        }
        x[i] = s / lu[[i, i]];
    }
    Some(x)
}

/// Computes the lower-triangular Cholesky factor `L` with `A = L L'`.
/// Returns `None` when `A` is not (numerically) positive-definite.
pub(crate) fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solves `L L' x = b` given the Cholesky factor `L`.
pub(crate) fn chol_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();
    debug_assert_eq!(b.len(), n);

    // Forward solve L y = b.
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    // Backward solve L' x = y.
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}
