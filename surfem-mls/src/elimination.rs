use nalgebra::{DMatrix, DVector};
use std::error::Error;
use std::fmt;

/// Pivots smaller than this, relative to the largest coefficient, count as zero.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-13;

/// Gaussian elimination found no usable pivot in the given column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingularSystem {
    pub column: usize,
}

impl fmt::Display for SingularSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix is singular (no pivot in column {})", self.column)
    }
}

impl Error for SingularSystem {}

/// Solves the `n x n` system stored in the augmented `n x (n + 1)` matrix `[A | b]`.
///
/// Uses Gaussian elimination with partial pivoting followed by back substitution.
///
/// # Panics
///
/// Panics if the matrix is not of shape `n x (n + 1)`.
#[allow(non_snake_case)]
pub fn gaussian_elimination(mut Ab: DMatrix<f64>) -> Result<DVector<f64>, SingularSystem> {
    let n = Ab.nrows();
    assert_eq!(Ab.ncols(), n + 1, "Augmented matrix must have n + 1 columns");

    let scale = Ab.columns(0, n).amax();
    if scale == 0.0 {
        return Err(SingularSystem { column: 0 });
    }
    let tolerance = RELATIVE_PIVOT_TOLERANCE * scale;

    for i in 0..n {
        let (offset, pivot) = Ab
            .view((i, i), (n - i, 1))
            .iter()
            .enumerate()
            .fold((0, 0.0), |(k_max, max), (k, &v)| {
                if v.abs() > max {
                    (k, v.abs())
                } else {
                    (k_max, max)
                }
            });
        if pivot <= tolerance {
            return Err(SingularSystem { column: i });
        }
        if offset != 0 {
            Ab.swap_rows(i, i + offset);
        }

        for j in (i + 1)..n {
            let m_ji = Ab[(j, i)] / Ab[(i, i)];
            for k in i..=n {
                Ab[(j, k)] -= m_ji * Ab[(i, k)];
            }
        }
    }

    let mut x = DVector::zeros(n);
    for i in (0..n).rev() {
        let mut x_i = Ab[(i, n)];
        for j in (i + 1)..n {
            x_i -= Ab[(i, j)] * x[j];
        }
        x[i] = x_i / Ab[(i, i)];
    }

    Ok(x)
}
