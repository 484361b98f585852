//! Correlation and summary statistics over day distributions.
//!
//! Correlation is Pearson's r over the positional overlap of two paths,
//! skipping pairs where either side is NaN. Undefined results are `None`
//! rather than NaN.

/// Pearson correlation of `a` and `b` over their common prefix.
///
/// `None` with fewer than two complete pairs or when either side has zero
/// variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x * var_y).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Median, averaging the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    let v = sorted(values);
    let n = v.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(v[n / 2]),
        _ => Some((v[n / 2 - 1] + v[n / 2]) / 2.0),
    }
}

/// Median that is always an element: the upper middle value for an even
/// count.
pub fn median_high(values: &[f64]) -> Option<f64> {
    let v = sorted(values);
    v.get(v.len() / 2).copied()
}

/// Sample standard deviation (n - 1 divisor). `None` below two values.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Bin of `value` among `bins` equal-width bins over `[-1, 1]`.
///
/// The last bin is closed on the right; out-of-range values clamp to the
/// edge bins.
pub fn correlation_bin(value: f64, bins: usize) -> usize {
    let width = 2.0 / bins as f64;
    let raw = ((value + 1.0) / width).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(bins - 1)
    }
}

/// Center of bin `i` among `bins` equal-width bins over `[-1, 1]`.
pub fn bin_center(i: usize, bins: usize) -> f64 {
    let width = 2.0 / bins as f64;
    -1.0 + width * (i as f64 + 0.5)
}

/// Per-bin counts of `values` over `[-1, 1]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<u32> {
    let mut counts = vec![0u32; bins];
    if bins == 0 {
        return counts;
    }
    for &v in values.iter().filter(|v| !v.is_nan()) {
        counts[correlation_bin(v, bins)] += 1;
    }
    counts
}

/// Rolling-window size for averaging a table of `len` days.
pub fn rolling_window_for(len: usize) -> usize {
    match len {
        0..=20 => 2,
        21..=100 => 3,
        101..=300 => 5,
        _ => 10,
    }
}

/// Trailing mean over `window` values; the first `window - 1` are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}
