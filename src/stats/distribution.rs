//! Order statistics over a numeric population.
//!
//! Empty inputs never fail: callers treat "no data" as a scoreable state and
//! get a fixed fallback instead (0 for location statistics, 50 for ranks).

/// Returns a sorted copy. `total_cmp` keeps NaN from panicking the sort.
fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle element, or the mean of the two middle elements for even counts.
pub fn median(values: &[f64]) -> f64 {
    let v = sorted(values);
    let n = v.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (v[n / 2 - 1] + v[n / 2]) / 2.0
    } else {
        v[n / 2]
    }
}

/// Indexed (non-interpolated) percentile: element at `floor(p/100 * n)`,
/// clamped to the last index.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let v = sorted(values);
    let Some(last) = v.len().checked_sub(1) else {
        return 0.0;
    };
    let index = ((p / 100.0) * v.len() as f64).floor().max(0.0) as usize;
    v[index.min(last)]
}

/// Share of `distribution` strictly below `value`, as 0–100.
/// An empty distribution ranks everything at the midpoint.
pub fn percentile_rank(value: f64, distribution: &[f64]) -> f64 {
    if distribution.is_empty() {
        return 50.0;
    }
    let below = distribution.iter().filter(|&&x| x < value).count();
    below as f64 / distribution.len() as f64 * 100.0
}
