use analysis_core::{AnalysisError, Classification};
use serde::{Deserialize, Serialize};

/// Overbought/oversold threshold pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub overbought: f64,
    pub oversold: f64,
}

impl Thresholds {
    pub const fn new(overbought: f64, oversold: f64) -> Self {
        Self { overbought, oversold }
    }

    /// Strictly above `overbought` or strictly below `oversold`; undefined
    /// values are unclassified.
    pub fn classify(&self, value: Option<f64>) -> Classification {
        match value {
            None => Classification::Unclassified,
            Some(v) if v > self.overbought => Classification::Overbought,
            Some(v) if v < self.oversold => Classification::Oversold,
            Some(_) => Classification::Neutral,
        }
    }
}

/// Price relative to a moving average: above is bullish, below bearish.
pub fn classify_bias(price: f64, average: Option<f64>) -> Classification {
    match average {
        None => Classification::Unclassified,
        Some(avg) if price > avg => Classification::Bullish,
        Some(avg) if price < avg => Classification::Bearish,
        Some(_) => Classification::Neutral,
    }
}

/// Price relative to the Bollinger envelope.
pub fn classify_envelope(price: f64, upper: Option<f64>, lower: Option<f64>) -> Classification {
    match (upper, lower) {
        (Some(upper), _) if price > upper => Classification::Overbought,
        (_, Some(lower)) if price < lower => Classification::Oversold,
        (Some(_), Some(_)) => Classification::Neutral,
        _ => Classification::Unclassified,
    }
}

/// Windows and thresholds for every indicator the engine computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalSettings {
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub rsi_period: usize,
    pub rsi_thresholds: Thresholds,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub stochastic_thresholds: Thresholds,
    pub williams_period: usize,
    pub williams_thresholds: Thresholds,
    pub cci_period: usize,
    pub cci_constant: f64,
    pub cci_thresholds: Thresholds,
    pub atr_period: usize,
    /// Bars on each side a pivot must dominate
    pub pivot_lookaround: usize,
    /// Levels closer than this percentage are merged
    pub level_proximity_pct: f64,
    pub range_lookback: usize,
    pub range_quantile: f64,
}

impl Default for TechnicalSettings {
    fn default() -> Self {
        Self {
            sma_periods: vec![20, 50, 200],
            ema_periods: vec![12, 26],
            rsi_period: 14,
            rsi_thresholds: Thresholds::new(70.0, 30.0),
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            stochastic_thresholds: Thresholds::new(80.0, 20.0),
            williams_period: 14,
            williams_thresholds: Thresholds::new(-20.0, -80.0),
            cci_period: 20,
            cci_constant: 0.015,
            cci_thresholds: Thresholds::new(100.0, -100.0),
            atr_period: 14,
            pivot_lookaround: 10,
            level_proximity_pct: 1.5,
            range_lookback: 50,
            range_quantile: 0.05,
        }
    }
}

impl TechnicalSettings {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let mut windows = self
            .sma_periods
            .iter()
            .chain(&self.ema_periods)
            .chain([
                &self.rsi_period,
                &self.macd_fast,
                &self.macd_slow,
                &self.macd_signal,
                &self.bollinger_period,
                &self.stochastic_k,
                &self.stochastic_d,
                &self.williams_period,
                &self.cci_period,
                &self.atr_period,
                &self.pivot_lookaround,
                &self.range_lookback,
            ]);
        if windows.any(|&w| w == 0) {
            return Err(AnalysisError::InvalidConfig(
                "indicator windows must be positive".to_string(),
            ));
        }

        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::InvalidConfig(format!(
                "MACD fast period {} must be shorter than slow period {}",
                self.macd_fast, self.macd_slow
            )));
        }

        for (name, t) in [
            ("rsi", self.rsi_thresholds),
            ("stochastic", self.stochastic_thresholds),
            ("williams_r", self.williams_thresholds),
            ("cci", self.cci_thresholds),
        ] {
            if t.overbought <= t.oversold {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} overbought threshold must exceed oversold threshold",
                    name
                )));
            }
        }

        let valid_bands = self.bollinger_std_dev.is_finite() && self.bollinger_std_dev >= 0.0;
        let valid_cci = self.cci_constant.is_finite() && self.cci_constant > 0.0;
        if !valid_bands || !valid_cci {
            return Err(AnalysisError::InvalidConfig(
                "Bollinger width must be non-negative and CCI constant positive".to_string(),
            ));
        }
        let valid_proximity =
            self.level_proximity_pct.is_finite() && self.level_proximity_pct >= 0.0;
        if !(0.0..0.5).contains(&self.range_quantile) || !valid_proximity {
            return Err(AnalysisError::InvalidConfig(
                "range quantile must be in [0, 0.5) and level proximity non-negative".to_string(),
            ));
        }

        Ok(())
    }
}
