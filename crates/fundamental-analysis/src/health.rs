//! Weighted health score over a configurable subset of ratios.
//!
//! Each component normalizes one ratio into a `[0, 1]` contribution. Missing
//! ratios drop out and the remaining weights are renormalized, so the score
//! always spans 0 to 100 regardless of coverage.

use analysis_core::{AnalysisError, FundamentalMetrics, HealthScore, Rating};
use serde::{Deserialize, Serialize};

const WEIGHT_TOTAL: f64 = 100.0;
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Ratios the scorer can weigh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    PeRatio,
    PbRatio,
    PsRatio,
    PegRatio,
    EvEbitda,
    Roe,
    Roa,
    GrossMargin,
    OperatingMargin,
    NetMargin,
    EbitdaMargin,
    CurrentRatio,
    QuickRatio,
    CashRatio,
    DebtToEquity,
    DebtToAssets,
    EquityRatio,
    RevenueGrowth,
    EarningsGrowth,
    AssetTurnover,
    DividendYield,
    PayoutRatio,
}

impl HealthMetric {
    pub fn value(&self, m: &FundamentalMetrics) -> Option<f64> {
        match self {
            HealthMetric::PeRatio => m.valuation.pe_ratio,
            HealthMetric::PbRatio => m.valuation.pb_ratio,
            HealthMetric::PsRatio => m.valuation.ps_ratio,
            HealthMetric::PegRatio => m.valuation.peg_ratio,
            HealthMetric::EvEbitda => m.valuation.ev_ebitda,
            HealthMetric::Roe => m.profitability.roe,
            HealthMetric::Roa => m.profitability.roa,
            HealthMetric::GrossMargin => m.profitability.gross_margin,
            HealthMetric::OperatingMargin => m.profitability.operating_margin,
            HealthMetric::NetMargin => m.profitability.net_margin,
            HealthMetric::EbitdaMargin => m.profitability.ebitda_margin,
            HealthMetric::CurrentRatio => m.liquidity.current_ratio,
            HealthMetric::QuickRatio => m.liquidity.quick_ratio,
            HealthMetric::CashRatio => m.liquidity.cash_ratio,
            HealthMetric::DebtToEquity => m.leverage.debt_to_equity,
            HealthMetric::DebtToAssets => m.leverage.debt_to_assets,
            HealthMetric::EquityRatio => m.leverage.equity_ratio,
            HealthMetric::RevenueGrowth => m.growth.revenue_growth,
            HealthMetric::EarningsGrowth => m.growth.earnings_growth,
            HealthMetric::AssetTurnover => m.efficiency.asset_turnover,
            HealthMetric::DividendYield => m.dividend.dividend_yield,
            HealthMetric::PayoutRatio => m.dividend.payout_ratio,
        }
    }
}

/// Maps a raw ratio onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    /// 0 at `worst`, 1 at `best`, clamped. Lower-is-better when `worst > best`.
    Linear { worst: f64, best: f64 },
    /// 1 inside `[low, high]`, falling to 0 at `tolerance` beyond either edge.
    Band { low: f64, high: f64, tolerance: f64 },
}

impl Normalization {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Normalization::Linear { worst, best } => {
                ((value - worst) / (best - worst)).clamp(0.0, 1.0)
            }
            Normalization::Band { low, high, tolerance } => {
                let distance = if value < low {
                    low - value
                } else if value > high {
                    value - high
                } else {
                    return 1.0;
                };
                if tolerance <= 0.0 {
                    0.0
                } else {
                    (1.0 - distance / tolerance).clamp(0.0, 1.0)
                }
            }
        }
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        let ok = match *self {
            Normalization::Linear { worst, best } => {
                worst.is_finite() && best.is_finite() && worst != best
            }
            Normalization::Band { low, high, tolerance } => {
                low.is_finite()
                    && high.is_finite()
                    && low <= high
                    && tolerance.is_finite()
                    && tolerance >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(AnalysisError::InvalidConfig(format!("degenerate normalization {:?}", self)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthComponent {
    pub metric: HealthMetric,
    pub weight: f64,
    pub normalization: Normalization,
}

impl HealthComponent {
    fn linear(metric: HealthMetric, weight: f64, worst: f64, best: f64) -> Self {
        Self {
            metric,
            weight,
            normalization: Normalization::Linear { worst, best },
        }
    }
}

/// Minimum score for each tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self {
            excellent: 80.0,
            good: 60.0,
            fair: 40.0,
        }
    }
}

impl RatingThresholds {
    pub fn rating(&self, score: f64) -> Rating {
        if score >= self.excellent {
            Rating::Excellent
        } else if score >= self.good {
            Rating::Good
        } else if score >= self.fair {
            Rating::Fair
        } else {
            Rating::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    pub components: Vec<HealthComponent>,
    #[serde(default)]
    pub thresholds: RatingThresholds,
}

impl Default for HealthConfig {
    fn default() -> Self {
        use HealthMetric::*;

        Self {
            components: vec![
                HealthComponent::linear(Roe, 10.0, 0.0, 0.15),
                HealthComponent::linear(NetMargin, 10.0, 0.0, 0.10),
                HealthComponent::linear(OperatingMargin, 10.0, 0.0, 0.15),
                HealthComponent::linear(CurrentRatio, 10.0, 1.0, 1.5),
                HealthComponent::linear(QuickRatio, 10.0, 0.5, 1.0),
                HealthComponent::linear(DebtToEquity, 20.0, 2.0, 0.5),
                HealthComponent::linear(RevenueGrowth, 10.0, 0.0, 0.10),
                HealthComponent::linear(EarningsGrowth, 10.0, 0.0, 0.10),
                HealthComponent {
                    metric: PeRatio,
                    weight: 10.0,
                    normalization: Normalization::Band {
                        low: 10.0,
                        high: 20.0,
                        tolerance: 10.0,
                    },
                },
            ],
            thresholds: RatingThresholds::default(),
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.components.is_empty() {
            return Err(AnalysisError::InvalidConfig("health config has no components".to_string()));
        }

        for component in &self.components {
            if !component.weight.is_finite() || component.weight <= 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "weight for {:?} must be positive",
                    component.metric
                )));
            }
            component.normalization.validate()?;
        }

        let total: f64 = self.components.iter().map(|c| c.weight).sum();
        if (total - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
            return Err(AnalysisError::InvalidConfig(format!(
                "health weights sum to {}, expected {}",
                total, WEIGHT_TOTAL
            )));
        }

        let t = &self.thresholds;
        let descending = t.excellent > t.good && t.good > t.fair && t.fair >= 0.0;
        if !descending || t.excellent > WEIGHT_TOTAL {
            return Err(AnalysisError::InvalidConfig(
                "rating thresholds must descend within [0, 100]".to_string(),
            ));
        }

        Ok(())
    }

    /// Scores the available ratios; `None` when none of them are present.
    pub fn score(&self, metrics: &FundamentalMetrics) -> Option<HealthScore> {
        let mut earned = 0.0;
        let mut available_weight = 0.0;
        let mut total_weight = 0.0;

        for component in &self.components {
            total_weight += component.weight;
            if let Some(value) = component.metric.value(metrics) {
                earned += component.weight * component.normalization.apply(value);
                available_weight += component.weight;
            }
        }

        if available_weight <= 0.0 {
            return None;
        }

        let score = (earned / available_weight * WEIGHT_TOTAL).clamp(0.0, WEIGHT_TOTAL);
        Some(HealthScore {
            score,
            rating: self.thresholds.rating(score),
            max_score: WEIGHT_TOTAL,
            coverage: available_weight / total_weight,
        })
    }
}
