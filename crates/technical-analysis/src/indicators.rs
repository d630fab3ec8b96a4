use analysis_core::{finite, PricePoint};

use crate::series::{
    chain, ema, quantile, rolling_max, rolling_mean, rolling_mean_abs_dev, rolling_mean_defined,
    rolling_min, rolling_stddev, wilder_smooth, Series,
};

/// Indicators produced by the engine, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Sma(usize),
    Ema(usize),
    Rsi,
    Macd,
    Bollinger,
    Stochastic,
    WilliamsR,
    Cci,
    Atr,
}

impl Indicator {
    /// Key used in the report's indicator map
    pub fn key(&self) -> String {
        match self {
            Indicator::Sma(p) => format!("sma_{}", p),
            Indicator::Ema(p) => format!("ema_{}", p),
            Indicator::Rsi => "rsi".to_string(),
            Indicator::Macd => "macd".to_string(),
            Indicator::Bollinger => "bollinger_bands".to_string(),
            Indicator::Stochastic => "stochastic".to_string(),
            Indicator::WilliamsR => "williams_r".to_string(),
            Indicator::Cci => "cci".to_string(),
            Indicator::Atr => "atr".to_string(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Indicator::Sma(p) => format!("SMA{}", p),
            Indicator::Ema(p) => format!("EMA{}", p),
            Indicator::Rsi => "RSI".to_string(),
            Indicator::Macd => "MACD".to_string(),
            Indicator::Bollinger => "Bollinger Bands".to_string(),
            Indicator::Stochastic => "Stochastic".to_string(),
            Indicator::WilliamsR => "Williams %R".to_string(),
            Indicator::Cci => "CCI".to_string(),
            Indicator::Atr => "ATR".to_string(),
        }
    }
}

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Series {
    rolling_mean(data, period)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // No losses: pure uptrend reads 100, a flat window reads neutral.
        if avg_gain == 0.0 {
            50.0
        } else {
            100.0
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Relative Strength Index using Wilder-smoothed gains and losses.
/// First defined at index `period` (needs `period` deltas).
pub fn rsi(data: &[f64], period: usize) -> Series {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for w in data.windows(2) {
        let change = w[1] - w[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = wilder_smooth(&gains, period);
    let avg_loss = wilder_smooth(&losses, period);

    for (j, (g, l)) in avg_gain.iter().zip(&avg_loss).enumerate() {
        if let (Some(g), Some(l)) = (g, l) {
            result[j + 1] = finite(rsi_from_averages(*g, *l));
        }
    }
    result
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone)]
pub struct MacdResult {
    pub macd_line: Series,
    pub signal_line: Series,
    pub histogram: Series,
}

pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdResult {
    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Series = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = chain(&macd_line, |d| ema(d, signal_period));
    let histogram: Series = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish,
    Bearish,
}

/// Crossover on bar `i` of a MACD histogram, if any.
///
/// The histogram must be non-zero on bar `i` with the opposite sign of the
/// last non-zero bar before it. Bars sitting exactly on zero are skipped, so
/// touching zero and returning to the same side is not a crossover.
pub fn crossover_at(histogram: &[Option<f64>], i: usize) -> Option<Crossover> {
    if i == 0 || i >= histogram.len() {
        return None;
    }
    let cur = histogram[i]?;
    let mut j = i;
    let prev = loop {
        j = j.checked_sub(1)?;
        match histogram[j]? {
            v if v == 0.0 => continue,
            v => break v,
        }
    };
    if prev < 0.0 && cur > 0.0 {
        Some(Crossover::Bullish)
    } else if prev > 0.0 && cur < 0.0 {
        Some(Crossover::Bearish)
    } else {
        None
    }
}

/// Most recent crossover in the histogram with the bar it happened on.
pub fn last_crossover(histogram: &[Option<f64>]) -> Option<(usize, Crossover)> {
    (1..histogram.len())
        .rev()
        .find_map(|i| crossover_at(histogram, i).map(|c| (i, c)))
}

/// Side of zero the histogram starts on: the sign of its first non-zero
/// defined value.
pub fn initial_direction(histogram: &[Option<f64>]) -> Option<Crossover> {
    histogram
        .iter()
        .flatten()
        .find(|v| **v != 0.0)
        .map(|v| if *v > 0.0 { Crossover::Bullish } else { Crossover::Bearish })
}

/// Bollinger Bands
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let middle = rolling_mean(data, period);
    let deviation = rolling_stddev(data, period);

    let mut upper = Vec::with_capacity(data.len());
    let mut lower = Vec::with_capacity(data.len());
    for (m, sd) in middle.iter().zip(&deviation) {
        match (m, sd) {
            (Some(m), Some(sd)) => {
                upper.push(finite(m + std_dev * sd));
                lower.push(finite(m - std_dev * sd));
            }
            _ => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// Stochastic Oscillator
#[derive(Debug, Clone)]
pub struct StochasticResult {
    pub k: Series,
    pub d: Series,
}

/// %K from the close's position in the rolling high-low range; %D is its
/// moving average.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticResult {
    let k = range_position(highs, lows, closes, k_period)
        .into_iter()
        .map(|pos| finite(100.0 * pos?))
        .collect::<Series>();
    let d = rolling_mean_defined(&k, d_period);

    StochasticResult { k, d }
}

/// Williams %R, from -100 (at the low) to 0 (at the high)
pub fn williams_r(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    range_position(highs, lows, closes, period)
        .into_iter()
        .map(|pos| finite(-100.0 * (1.0 - pos?)))
        .collect()
}

/// Where each close sits in its rolling high-low range, 0 at the low and 1 at
/// the high. Undefined while the range is empty.
fn range_position(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Series {
    let highest = rolling_max(highs, period);
    let lowest = rolling_min(lows, period);

    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let (hh, ll) = ((*highest.get(i)?)?, (*lowest.get(i)?)?);
            if hh > ll {
                finite((close - ll) / (hh - ll))
            } else {
                None
            }
        })
        .collect()
}

/// Commodity Channel Index over typical price
pub fn cci(typical: &[f64], period: usize, constant: f64) -> Series {
    let average = rolling_mean(typical, period);
    let deviation = rolling_mean_abs_dev(typical, period);

    typical
        .iter()
        .enumerate()
        .map(|(i, tp)| {
            let (avg, mad) = (average[i]?, deviation[i]?);
            if mad > 0.0 {
                finite((tp - avg) / (constant * mad))
            } else {
                Some(0.0)
            }
        })
        .collect()
}

/// True range per bar; the first bar has no previous close and is skipped,
/// so the output is one shorter than the input.
pub fn true_range(points: &[PricePoint]) -> Vec<f64> {
    points
        .windows(2)
        .map(|w| {
            let high_low = w[1].high - w[1].low;
            let high_close = (w[1].high - w[0].close).abs();
            let low_close = (w[1].low - w[0].close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range, aligned with `points`
pub fn atr(points: &[PricePoint], period: usize) -> Series {
    let mut result = vec![None; points.len()];
    let smoothed = wilder_smooth(&true_range(points), period);
    for (j, value) in smoothed.into_iter().enumerate() {
        result[j + 1] = value;
    }
    result
}

/// Support and resistance candidates from local extremes
#[derive(Debug, Clone, Default)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Sorts levels ascending and absorbs any level within `proximity_pct`
/// percent of the last kept one.
pub fn dedupe_levels(mut levels: Vec<f64>, proximity_pct: f64) -> Vec<f64> {
    levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut kept: Vec<f64> = Vec::new();
    for level in levels {
        match kept.last() {
            Some(&last) if (level - last).abs() <= last.abs() * proximity_pct / 100.0 => {}
            _ => kept.push(level),
        }
    }
    kept
}

/// A bar is a support (resistance) candidate when its low (high) is the
/// extreme of the `lookaround` bars on each side. Bars without a full window
/// on both sides are not considered.
pub fn support_resistance(
    points: &[PricePoint],
    lookaround: usize,
    proximity_pct: f64,
) -> SupportResistance {
    if lookaround == 0 || points.len() < 2 * lookaround + 1 {
        return SupportResistance::default();
    }

    let mut support = Vec::new();
    let mut resistance = Vec::new();
    for i in lookaround..points.len() - lookaround {
        let window = &points[i - lookaround..=i + lookaround];
        if window.iter().all(|p| p.low >= points[i].low) {
            support.push(points[i].low);
        }
        if window.iter().all(|p| p.high <= points[i].high) {
            resistance.push(points[i].high);
        }
    }

    SupportResistance {
        support: dedupe_levels(support, proximity_pct),
        resistance: dedupe_levels(resistance, proximity_pct),
    }
}

/// Low quantile of recent lows and the mirrored quantile of recent highs.
pub fn range_levels(points: &[PricePoint], lookback: usize, q: f64) -> (Option<f64>, Option<f64>) {
    let recent = &points[points.len().saturating_sub(lookback)..];
    let lows: Vec<f64> = recent.iter().map(|p| p.low).collect();
    let highs: Vec<f64> = recent.iter().map(|p| p.high).collect();
    (quantile(&lows, q), quantile(&highs, 1.0 - q))
}
