//! Small dense linear algebra for the alternating least squares subproblems.
//!
//! The systems solved here are rank×rank (rank is at most a few dozen), so a
//! plain Cholesky factorization is all that is needed; no LAPACK binding.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};

/// Cholesky factor (lower triangular) of a symmetric positive-definite
/// matrix, or `None` if a pivot is not strictly positive.
fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 {
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

/// Solve `L Lᵀ x = b` given the lower Cholesky factor.
fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    // Back substitution: Lᵀ x = y
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

/// Solve the symmetric positive-semidefinite system `a x = b`.
///
/// With a zero regularization strength the normal matrix can be singular
/// (fewer observations than factors); in that case one retry is made with a
/// small diagonal jitter before giving up.
pub(crate) fn solve_spd(a: &Array2<f64>, b: &Array1<f64>, context: &str) -> Result<Array1<f64>> {
    if let Some(l) = cholesky(a) {
        return Ok(cholesky_solve(&l, b));
    }

    let n = a.nrows();
    let trace: f64 = (0..n).map(|i| a[[i, i]]).sum();
    let jitter = 1e-8 * (trace / n as f64).max(1.0);

    let mut jittered = a.clone();
    for i in 0..n {
        jittered[[i, i]] += jitter;
    }
    match cholesky(&jittered) {
        Some(l) => Ok(cholesky_solve(&l, b)),
        None => Err(ModelError::SingularSystem {
            context: context.to_string(),
        }),
    }
}
