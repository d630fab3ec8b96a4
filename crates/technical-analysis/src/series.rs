//! Windowed statistics over an ordered numeric sequence.
//!
//! Every function returns a vector aligned with its input: index `i` holds the
//! statistic for the window ending at `i`, or `None` while fewer than `window`
//! values are available. There is no partial-window output.

use analysis_core::finite;

/// Output aligned with the input sequence; `None` means undefined.
pub type Series = Vec<Option<f64>>;

/// Applies `f` to every full window, the generic evaluator behind the rolling
/// statistics below.
pub fn rolling<F>(data: &[f64], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> f64,
{
    let mut result = vec![None; data.len()];
    if window == 0 || data.len() < window {
        return result;
    }

    for i in window - 1..data.len() {
        result[i] = finite(f(&data[i + 1 - window..=i]));
    }
    result
}

pub fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation
pub fn population_std_dev(data: &[f64]) -> f64 {
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Mean absolute deviation around the window mean
pub fn mean_abs_deviation(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m).abs()).sum::<f64>() / data.len() as f64
}

pub fn rolling_mean(data: &[f64], window: usize) -> Series {
    rolling(data, window, mean)
}

pub fn rolling_stddev(data: &[f64], window: usize) -> Series {
    rolling(data, window, population_std_dev)
}

pub fn rolling_max(data: &[f64], window: usize) -> Series {
    rolling(data, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_min(data: &[f64], window: usize) -> Series {
    rolling(data, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_mean_abs_dev(data: &[f64], window: usize) -> Series {
    rolling(data, window, mean_abs_deviation)
}

/// Exponential moving average, alpha = 2 / (period + 1), seeded with the
/// simple mean of the first `period` values.
pub fn ema(data: &[f64], period: usize) -> Series {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = mean(&data[..period]);
    result[period - 1] = finite(prev);

    for i in period..data.len() {
        prev += alpha * (data[i] - prev);
        result[i] = finite(prev);
    }
    result
}

/// Wilder's smoothing: seed with the mean of the first `period` values, then
/// `s[t] = (s[t-1] * (period - 1) + v[t]) / period`.
pub fn wilder_smooth(data: &[f64], period: usize) -> Series {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let mut prev = mean(&data[..period]);
    result[period - 1] = finite(prev);

    for i in period..data.len() {
        prev = (prev * (period - 1) as f64 + data[i]) / period as f64;
        result[i] = finite(prev);
    }
    result
}

/// Runs `f` over the contiguous defined tail of `series` and re-aligns the
/// output to the full length. Used to chain smoothers (e.g. the MACD signal
/// line is an EMA of the MACD line, which is undefined for its first bars).
pub fn chain<F>(series: &[Option<f64>], f: F) -> Series
where
    F: Fn(&[f64]) -> Series,
{
    let start = series
        .iter()
        .rposition(Option::is_none)
        .map_or(0, |i| i + 1);
    let tail: Vec<f64> = series[start..].iter().flatten().copied().collect();

    let mut result = vec![None; start];
    result.extend(f(&tail));
    result
}

/// Rolling mean over a series with gaps; a window containing any undefined
/// value is itself undefined.
pub fn rolling_mean_defined(series: &[Option<f64>], window: usize) -> Series {
    let mut result = vec![None; series.len()];
    if window == 0 || series.len() < window {
        return result;
    }

    for i in window - 1..series.len() {
        let slice = &series[i + 1 - window..=i];
        if slice.iter().all(Option::is_some) {
            let values: Vec<f64> = slice.iter().flatten().copied().collect();
            result[i] = finite(mean(&values));
        }
    }
    result
}

/// Linear-interpolated quantile, `q` in [0, 1].
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    finite(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Last element of an aligned series, flattened.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Second-to-last element of an aligned series, flattened.
pub fn previous(series: &[Option<f64>]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    series[series.len() - 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_mean_aligned_output() {
        let result = rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(result, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_zero_window_is_undefined() {
        assert!(rolling_mean(&[1.0, 2.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn test_rolling_stddev_population() {
        let result = rolling_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        assert!((latest(&result).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_min_max() {
        let data = [3.0, 1.0, 4.0, 1.5, 5.0];
        assert_eq!(latest(&rolling_max(&data, 3)), Some(5.0));
        assert_eq!(latest(&rolling_min(&data, 3)), Some(1.5));
    }

    #[test]
    fn test_ema_seed_and_recurrence() {
        let result = ema(&[22.0, 24.0, 23.0, 25.0], 3);
        assert_eq!(result[1], None);
        assert!((result[2].unwrap() - 23.0).abs() < 1e-12);
        // alpha = 0.5
        assert!((result[3].unwrap() - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_wilder_smooth_recurrence() {
        let result = wilder_smooth(&[1.0, 2.0, 3.0, 6.0], 3);
        assert!((result[2].unwrap() - 2.0).abs() < 1e-12);
        // (2 * 2 + 6) / 3
        assert!((result[3].unwrap() - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_chain_realigns_tail() {
        let series = vec![None, None, Some(1.0), Some(3.0), Some(5.0)];
        let result = chain(&series, |d| rolling_mean(d, 2));
        assert_eq!(result, vec![None, None, None, Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_mean_defined_skips_gaps() {
        let series = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let result = rolling_mean_defined(&series, 2);
        assert_eq!(result, vec![None, None, None, Some(4.0), Some(6.0)]);
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&data, 0.5), Some(3.0));
        assert!((quantile(&data, 0.95).unwrap() - 4.8).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), None);
    }
}
