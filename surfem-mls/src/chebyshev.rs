/// Evaluates the Chebyshev polynomials `T_0, ..., T_n` at `x`.
pub fn chebyshev(n: usize, x: f64) -> Vec<f64> {
    let mut values = Vec::with_capacity(n + 1);
    chebyshev_into(&mut values, n, x);
    values
}

/// Same as [`chebyshev`], but reuses the provided buffer.
///
/// Uses the three-term recurrence `T_0 = 1`, `T_1 = x`, `T_k = 2x T_{k-1} - T_{k-2}`.
pub fn chebyshev_into(values: &mut Vec<f64>, n: usize, x: f64) {
    values.clear();
    values.push(1.0);
    if n >= 1 {
        values.push(x);
    }
    for k in 2..=n {
        let next = 2.0 * x * values[k - 1] - values[k - 2];
        values.push(next);
    }
}
