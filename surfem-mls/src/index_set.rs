//! Multi-indices of bounded total degree.

/// Enumerates all multi-indices `a` of length `dimension` with `|a| <= degree`.
///
/// The enumeration runs a nested counter over the full `(degree + 1)^dimension` grid, with the
/// first counter advancing fastest, and keeps every entry with a small enough sum. Each kept
/// entry is stored with the counters in reverse order, so the last component varies fastest.
/// The result has `binomial(dimension + degree, degree)` entries.
pub fn compute_index_set(degree: usize, dimension: usize) -> Vec<Vec<usize>> {
    let mut set = Vec::with_capacity(binomial(dimension + degree, degree));
    let mut counters = vec![0; dimension + 1];

    while counters[dimension] == 0 {
        let entry_sum: usize = counters[..dimension].iter().sum();
        if entry_sum <= degree {
            set.push((0..dimension).map(|j| counters[dimension - 1 - j]).collect());
        }

        // Counters at their maximum restart at zero, the first one that is not advances
        let mut i = 0;
        while i < dimension && counters[i] == degree {
            counters[i] = 0;
            i += 1;
        }
        counters[i] += 1;
    }

    set
}

/// The binomial coefficient `n choose k` for `k <= n`.
pub fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
