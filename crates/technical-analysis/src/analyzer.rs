use analysis_core::{
    AnalysisError, Classification, IndicatorValue, PriceLevels, PriceSeries, TechnicalAnalyzer,
    TechnicalReport,
};
use rayon::prelude::*;

use crate::indicators::*;
use crate::series::{ema, latest, previous};
use crate::settings::{classify_bias, classify_envelope, TechnicalSettings};
use crate::signals::aggregate;

pub struct TechnicalAnalysisEngine {
    settings: TechnicalSettings,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            settings: TechnicalSettings::default(),
        }
    }

    pub fn with_settings(settings: TechnicalSettings) -> Result<Self, AnalysisError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &TechnicalSettings {
        &self.settings
    }

    /// Latest reading of every indicator, in report order
    pub fn compute_indicators(&self, series: &PriceSeries) -> Vec<(Indicator, IndicatorValue)> {
        let s = &self.settings;
        let points = series.points();
        let closes = series.closes();
        let (highs, lows) = (series.highs(), series.lows());
        let price = series.current_price();
        let mut out = Vec::new();

        // Moving averages
        for &period in &s.sma_periods {
            let indicator = Indicator::Sma(period);
            let value = latest(&sma(&closes, period));
            let state = classify_bias(price, value);
            out.push((indicator, IndicatorValue::new(indicator.key(), value, state)));
        }
        for &period in &s.ema_periods {
            let indicator = Indicator::Ema(period);
            let value = latest(&ema(&closes, period));
            let state = classify_bias(price, value);
            out.push((indicator, IndicatorValue::new(indicator.key(), value, state)));
        }

        // RSI
        let rsi_value = latest(&rsi(&closes, s.rsi_period));
        let rsi_state = s.rsi_thresholds.classify(rsi_value);
        out.push((
            Indicator::Rsi,
            IndicatorValue::new(Indicator::Rsi.key(), rsi_value, rsi_state),
        ));

        // MACD: state is the direction of the most recent crossover, or the
        // side the histogram started on if it never crossed
        let macd_result = macd(&closes, s.macd_fast, s.macd_slow, s.macd_signal);
        let macd_line = latest(&macd_result.macd_line);
        let histogram = latest(&macd_result.histogram);
        let crossover = last_crossover(&macd_result.histogram);
        let direction = crossover
            .map(|(_, c)| c)
            .or_else(|| initial_direction(&macd_result.histogram));
        let macd_state = match (histogram, direction) {
            (None, _) => Classification::Unclassified,
            (Some(_), Some(Crossover::Bullish)) => Classification::Bullish,
            (Some(_), Some(Crossover::Bearish)) => Classification::Bearish,
            (Some(_), None) => Classification::Neutral,
        };
        let bars_since_crossover = crossover.map(|(i, _)| (closes.len() - 1 - i) as f64);
        out.push((
            Indicator::Macd,
            IndicatorValue::new(Indicator::Macd.key(), histogram.and(macd_line), macd_state)
                .with_component("macd_line", macd_line)
                .with_component("signal_line", latest(&macd_result.signal_line))
                .with_component("histogram", histogram)
                .with_component("previous_histogram", previous(&macd_result.histogram))
                .with_component("bars_since_crossover", bars_since_crossover),
        ));

        // Bollinger Bands
        let bb = bollinger_bands(&closes, s.bollinger_period, s.bollinger_std_dev);
        let (upper, middle, lower) = (latest(&bb.upper), latest(&bb.middle), latest(&bb.lower));
        let bandwidth = match (upper, middle, lower) {
            (Some(u), Some(m), Some(l)) if m != 0.0 => Some((u - l) / m * 100.0),
            _ => None,
        };
        out.push((
            Indicator::Bollinger,
            IndicatorValue::new(
                Indicator::Bollinger.key(),
                middle,
                classify_envelope(price, upper, lower),
            )
                .with_component("upper", upper)
                .with_component("middle", middle)
                .with_component("lower", lower)
                .with_component("bandwidth", bandwidth),
        ));

        // Stochastic Oscillator
        let stoch = stochastic(&highs, &lows, &closes, s.stochastic_k, s.stochastic_d);
        let k = latest(&stoch.k);
        out.push((
            Indicator::Stochastic,
            IndicatorValue::new(Indicator::Stochastic.key(), k, s.stochastic_thresholds.classify(k))
                .with_component("k_percent", k)
                .with_component("d_percent", latest(&stoch.d)),
        ));

        // Williams %R
        let wr = latest(&williams_r(&highs, &lows, &closes, s.williams_period));
        out.push((
            Indicator::WilliamsR,
            IndicatorValue::new(Indicator::WilliamsR.key(), wr, s.williams_thresholds.classify(wr)),
        ));

        // CCI
        let cci_value = latest(&cci(&series.typical_prices(), s.cci_period, s.cci_constant));
        let cci_state = s.cci_thresholds.classify(cci_value);
        out.push((
            Indicator::Cci,
            IndicatorValue::new(Indicator::Cci.key(), cci_value, cci_state),
        ));

        // ATR: magnitude only
        let atr_value = latest(&atr(points, s.atr_period));
        out.push((
            Indicator::Atr,
            IndicatorValue::new(Indicator::Atr.key(), atr_value, Classification::Unclassified)
                .with_component("percentage", atr_value.map(|a| a / price * 100.0)),
        ));

        out
    }

    pub fn price_levels(&self, series: &PriceSeries) -> PriceLevels {
        let s = &self.settings;
        let pivots = support_resistance(series.points(), s.pivot_lookaround, s.level_proximity_pct);
        let (range_support, range_resistance) =
            range_levels(series.points(), s.range_lookback, s.range_quantile);

        PriceLevels {
            support: pivots.support,
            resistance: pivots.resistance,
            range_support,
            range_resistance,
        }
    }

    /// Builds the full report. Never fails on a constructed series: short
    /// history only leaves indicators undefined.
    pub fn evaluate(&self, series: &PriceSeries) -> TechnicalReport {
        let indicators = self.compute_indicators(series);
        let summary = aggregate(&indicators);

        let undefined: Vec<&str> = indicators
            .iter()
            .filter(|(_, v)| !v.is_defined())
            .map(|(_, v)| v.name.as_str())
            .collect();
        tracing::debug!(
            "Technical analysis for {}: {} bars, {} signals, undefined: {:?}",
            series.symbol(),
            series.len(),
            summary.signals.len(),
            undefined
        );

        TechnicalReport {
            symbol: series.symbol().to_string(),
            as_of: series.as_of(),
            current_price: series.current_price(),
            indicators: indicators
                .into_iter()
                .map(|(indicator, value)| (indicator.key(), value))
                .collect(),
            levels: self.price_levels(series),
            signals: summary.signals,
            bullish_count: summary.bullish_count,
            bearish_count: summary.bearish_count,
            overall_sentiment: summary.overall,
        }
    }

    /// Evaluates independent series in parallel.
    pub fn analyze_batch(&self, series: &[PriceSeries]) -> Vec<TechnicalReport> {
        series.par_iter().map(|s| self.evaluate(s)).collect()
    }
}

impl TechnicalAnalyzer for TechnicalAnalysisEngine {
    fn analyze(&self, series: &PriceSeries) -> Result<TechnicalReport, AnalysisError> {
        Ok(self.evaluate(series))
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
