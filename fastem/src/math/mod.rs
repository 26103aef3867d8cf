//! Order statistics: median, median absolute deviation, percentiles.

/// Calculate the median of f64 values in-place.
///
/// Mutates the input buffer (partial sort via quickselect). Even-length input
/// averages the two middle values.
#[inline]
pub fn median_f64_mut(data: &mut [f64]) -> f64 {
    debug_assert!(!data.is_empty());

    let len = data.len();
    let mid = len / 2;

    if len & 1 == 1 {
        let (_, median, _) = data.select_nth_unstable_by(mid, f64::total_cmp);
        *median
    } else {
        let (left_part, right_median, _) = data.select_nth_unstable_by(mid, f64::total_cmp);
        let right = *right_median;
        let left = left_part
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (left + right) * 0.5
    }
}

/// MAD = median(|x_i - center|).
///
/// `center` is supplied by the caller rather than recomputed, so the
/// dispersion can be taken around a reference value from another sample.
pub fn mad_f64(values: &[f64], center: f64) -> f64 {
    debug_assert!(!values.is_empty());

    let mut deviations: Vec<f64> = values.iter().map(|&v| (v - center).abs()).collect();
    median_f64_mut(&mut deviations)
}

/// The `pct`-th percentile of `samples` with linear interpolation between the
/// two closest ranks (`rank = pct / 100 * (n - 1)`).
///
/// `pct` must already be validated to lie in `[0, 100]`.
pub fn percentile_u16(samples: &[u16], pct: f64) -> f64 {
    debug_assert!(!samples.is_empty());
    debug_assert!((0.0..=100.0).contains(&pct));

    let mut scratch = samples.to_vec();
    let rank = pct / 100.0 * (scratch.len() - 1) as f64;
    let lower_rank = (rank.floor() as usize).min(scratch.len() - 1);
    let fraction = rank - lower_rank as f64;

    let (_, lower, upper) = scratch.select_nth_unstable(lower_rank);
    let lower = f64::from(*lower);

    if fraction <= 0.0 {
        return lower;
    }

    // Everything right of the partition point is >= lower; its minimum is the next rank.
    match upper.iter().copied().min() {
        Some(next) => lower + (f64::from(next) - lower) * fraction,
        None => lower,
    }
}

#[cfg(test)]
mod tests;
