use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current state of a single indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Bullish,
    Bearish,
    Neutral,
    Overbought,
    Oversold,
    /// Indicator has no directional reading (ATR, or undefined history)
    #[serde(rename = "none")]
    Unclassified,
}

impl Classification {
    /// Whether the aggregator should emit a label for this state.
    pub fn is_active(&self) -> bool {
        !matches!(self, Classification::Neutral | Classification::Unclassified)
    }

    /// Directional lean used for overall sentiment. Overbought/oversold
    /// readings are momentum extremes and do not lean.
    pub fn lean(&self) -> Option<Sentiment> {
        match self {
            Classification::Bullish => Some(Sentiment::Bullish),
            Classification::Bearish => Some(Sentiment::Bearish),
            _ => None,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Classification::Bullish => "bullish",
            Classification::Bearish => "bearish",
            Classification::Neutral => "neutral",
            Classification::Overbought => "overbought",
            Classification::Oversold => "oversold",
            Classification::Unclassified => "none",
        }
    }
}

/// Latest reading of one indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub name: String,
    /// `None` while the series is shorter than the indicator's window
    pub value: Option<f64>,
    pub signal: Classification,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, Option<f64>>,
}

impl IndicatorValue {
    pub fn new(name: impl Into<String>, value: Option<f64>, signal: Classification) -> Self {
        Self {
            name: name.into(),
            value,
            signal,
            components: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, key: &str, value: Option<f64>) -> Self {
        self.components.insert(key.to_string(), value);
        self
    }

    pub fn component(&self, key: &str) -> Option<f64> {
        self.components.get(key).copied().flatten()
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// Label emitted for an indicator in a non-neutral state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSignal {
    pub indicator: String,
    pub label: String,
    pub classification: Classification,
}

/// Support and resistance levels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    /// Local minima, ascending
    pub support: Vec<f64>,
    /// Local maxima, ascending
    pub resistance: Vec<f64>,
    /// Low-quantile of recent lows
    pub range_support: Option<f64>,
    /// High-quantile of recent highs
    pub range_resistance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalReport {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub indicators: BTreeMap<String, IndicatorValue>,
    pub levels: PriceLevels,
    pub signals: Vec<ActiveSignal>,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub overall_sentiment: Sentiment,
}

impl TechnicalReport {
    pub fn indicator(&self, name: &str) -> Option<&IndicatorValue> {
        self.indicators.get(name)
    }

    pub fn signal_labels(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.label.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationRatios {
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub ev_ebitda: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub ebitda_margin: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRatios {
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    pub debt_to_equity: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub equity_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRatios {
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRatios {
    pub asset_turnover: Option<f64>,
    pub inventory_turnover: Option<f64>,
    pub receivables_turnover: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendRatios {
    /// Annual dividend per share
    pub dividend_rate: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
    pub dividend_growth: Option<f64>,
}

/// All ratio categories for one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalMetrics {
    pub valuation: ValuationRatios,
    pub profitability: ProfitabilityRatios,
    pub liquidity: LiquidityRatios,
    pub leverage: LeverageRatios,
    pub growth: GrowthRatios,
    pub efficiency: EfficiencyRatios,
    pub dividend: DividendRatios,
}

/// Health rating tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Rating {
    /// Ordinal tier, 3 = Excellent down to 0 = Poor
    pub fn level(&self) -> u8 {
        match self {
            Rating::Excellent => 3,
            Rating::Good => 2,
            Rating::Fair => 1,
            Rating::Poor => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// 0 to 100
    pub score: f64,
    pub rating: Rating,
    pub max_score: f64,
    /// Fraction of configured weight backed by available ratios
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalReport {
    pub symbol: String,
    pub metrics: FundamentalMetrics,
    /// `None` when no scored ratio could be computed
    pub health_score: Option<HealthScore>,
}
