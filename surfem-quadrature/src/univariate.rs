//! Gauss-Legendre rules on `[-1, 1]`.
//!
//! The low orders requested by the reference elements come from closed-form tables. Other
//! orders are computed from the eigendecomposition of the Jacobi matrix of the Legendre
//! polynomials (Golub-Welsch).

use crate::Rule;
use nalgebra::{DMatrix, SymmetricEigen};

/// Gauss rule with `num_points` points, exact for polynomials of degree `2 num_points - 1`.
///
/// Points are sorted in increasing order and placed symmetrically about the origin.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    assert!(num_points > 0, "A Gauss rule needs at least one point");
    let (weights, points) = tabulated(num_points).unwrap_or_else(|| golub_welsch(num_points));
    (weights, points.into_iter().map(|x| [x]).collect())
}

fn tabulated(num_points: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    let rule = match num_points {
        1 => (vec![2.0], vec![0.0]),
        2 => {
            let x = 1.0 / 3f64.sqrt();
            (vec![1.0, 1.0], vec![-x, x])
        }
        3 => {
            let x = 0.6f64.sqrt();
            (vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0], vec![-x, 0.0, x])
        }
        4 => {
            let offset = 2.0 / 7.0 * 1.2f64.sqrt();
            let (inner, outer) = ((3.0 / 7.0 - offset).sqrt(), (3.0 / 7.0 + offset).sqrt());
            let (w_inner, w_outer) = ((18.0 + 30f64.sqrt()) / 36.0, (18.0 - 30f64.sqrt()) / 36.0);
            (
                vec![w_outer, w_inner, w_inner, w_outer],
                vec![-outer, -inner, inner, outer],
            )
        }
        _ => return None,
    };
    Some(rule)
}

/// Points are the eigenvalues of the symmetric tridiagonal Jacobi matrix with off-diagonal
/// entries `k / sqrt(4k² - 1)`, weights are `2 v_0²` for the normalized eigenvectors `v`.
fn golub_welsch(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut jacobi = DMatrix::zeros(n, n);
    for k in 1..n {
        let k_f = k as f64;
        let beta = k_f / (4.0 * k_f * k_f - 1.0).sqrt();
        jacobi[(k - 1, k)] = beta;
        jacobi[(k, k - 1)] = beta;
    }

    let eigen = SymmetricEigen::new(jacobi);
    let mut pairs: Vec<(f64, f64)> = eigen
        .eigenvalues
        .iter()
        .zip(eigen.eigenvectors.column_iter())
        .map(|(&x, v)| (x, 2.0 * v[0] * v[0]))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    // Exact symmetry about the origin
    for i in 0..n / 2 {
        let j = n - 1 - i;
        let x = 0.5 * (pairs[j].0 - pairs[i].0);
        let w = 0.5 * (pairs[i].1 + pairs[j].1);
        pairs[i] = (-x, w);
        pairs[j] = (x, w);
    }
    if n % 2 == 1 {
        pairs[n / 2].0 = 0.0;
    }

    pairs.into_iter().map(|(x, w)| (w, x)).unzip()
}
