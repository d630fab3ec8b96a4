use analysis_core::{ActiveSignal, Classification, IndicatorValue, Sentiment};

use crate::indicators::Indicator;

/// Labels for the active indicators plus the resulting sentiment
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSummary {
    pub signals: Vec<ActiveSignal>,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub overall: Sentiment,
}

fn label(indicator: Indicator, value: &IndicatorValue) -> String {
    let state = value.signal;
    match indicator {
        Indicator::Sma(_) | Indicator::Ema(_) => {
            let side = if state == Classification::Bullish { "above" } else { "below" };
            format!("Price {} {}", side, indicator.display_name())
        }
        Indicator::Macd => {
            let fresh = value.component("bars_since_crossover") == Some(0.0);
            if fresh {
                format!("MACD {} crossover", state.to_label())
            } else {
                format!("MACD {}", state.to_label())
            }
        }
        Indicator::Bollinger => match state {
            Classification::Overbought => "Price above upper Bollinger Band".to_string(),
            _ => "Price below lower Bollinger Band".to_string(),
        },
        _ => format!("{} {}", indicator.display_name(), state.to_label()),
    }
}

/// Emits one label per indicator in a non-neutral state, in input order.
///
/// Sentiment is bullish when bullish-leaning labels strictly outnumber
/// bearish-leaning ones, bearish for the reverse, and neutral on a tie.
/// Only bullish/bearish classifications lean; overbought/oversold are
/// reported but counted on neither side.
pub fn aggregate(indicators: &[(Indicator, IndicatorValue)]) -> SignalSummary {
    let mut signals = Vec::new();
    let mut bullish_count = 0;
    let mut bearish_count = 0;

    for (indicator, value) in indicators {
        if !value.is_defined() || !value.signal.is_active() {
            continue;
        }

        match value.signal.lean() {
            Some(Sentiment::Bullish) => bullish_count += 1,
            Some(Sentiment::Bearish) => bearish_count += 1,
            _ => {}
        }

        signals.push(ActiveSignal {
            indicator: indicator.key(),
            label: label(*indicator, value),
            classification: value.signal,
        });
    }

    let overall = if bullish_count > bearish_count {
        Sentiment::Bullish
    } else if bearish_count > bullish_count {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    };

    SignalSummary {
        signals,
        bullish_count,
        bearish_count,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(
        indicator: Indicator,
        value: Option<f64>,
        signal: Classification,
    ) -> (Indicator, IndicatorValue) {
        (indicator, IndicatorValue::new(indicator.key(), value, signal))
    }

    #[test]
    fn test_labels_skip_neutral_and_undefined() {
        let summary = aggregate(&[
            reading(Indicator::Sma(20), Some(10.0), Classification::Bullish),
            reading(Indicator::Sma(200), None, Classification::Unclassified),
            reading(Indicator::Rsi, Some(50.0), Classification::Neutral),
            reading(Indicator::Rsi, Some(25.0), Classification::Oversold),
            reading(Indicator::Atr, Some(1.2), Classification::Unclassified),
        ]);

        assert_eq!(
            summary.signals.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(),
            vec!["Price above SMA20", "RSI oversold"]
        );
        assert_eq!(summary.bullish_count, 1);
        assert_eq!(summary.bearish_count, 0);
        assert_eq!(summary.overall, Sentiment::Bullish);
    }

    #[test]
    fn test_tie_is_neutral() {
        let summary = aggregate(&[
            reading(Indicator::Sma(20), Some(10.0), Classification::Bullish),
            reading(Indicator::Ema(12), Some(11.0), Classification::Bearish),
        ]);
        assert_eq!(summary.overall, Sentiment::Neutral);

        let empty = aggregate(&[]);
        assert_eq!(empty.overall, Sentiment::Neutral);
        assert!(empty.signals.is_empty());
    }

    #[test]
    fn test_extremes_do_not_lean() {
        let summary = aggregate(&[
            reading(Indicator::Rsi, Some(80.0), Classification::Overbought),
            reading(Indicator::Cci, Some(150.0), Classification::Overbought),
            reading(Indicator::Ema(26), Some(9.0), Classification::Bullish),
        ]);
        assert_eq!(summary.signals.len(), 3);
        assert_eq!(summary.overall, Sentiment::Bullish);
    }

    #[test]
    fn test_macd_crossover_label_only_on_flip() {
        let macd = |bars_since: Option<f64>| {
            let (ind, value) = reading(Indicator::Macd, Some(0.4), Classification::Bullish);
            (ind, value.with_component("bars_since_crossover", bars_since))
        };

        assert_eq!(aggregate(&[macd(Some(0.0))]).signals[0].label, "MACD bullish crossover");
        assert_eq!(aggregate(&[macd(Some(3.0))]).signals[0].label, "MACD bullish");
        assert_eq!(aggregate(&[macd(None)]).signals[0].label, "MACD bullish");
    }

    #[test]
    fn test_band_labels() {
        let summary = aggregate(&[
            reading(Indicator::Bollinger, Some(100.0), Classification::Oversold),
            reading(Indicator::WilliamsR, Some(-10.0), Classification::Overbought),
        ]);
        assert_eq!(summary.signals[0].label, "Price below lower Bollinger Band");
        assert_eq!(summary.signals[1].label, "Williams %R overbought");
        assert_eq!(summary.overall, Sentiment::Neutral);
    }
}
