use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Period};

/// Daily OHLCV observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    /// Typical price, (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    fn validate(&self) -> Result<(), AnalysisError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidSeries(format!(
                    "{} {} on {} must be a positive finite number",
                    field, value, self.date
                )));
            }
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(AnalysisError::InvalidSeries(format!(
                "volume {} on {} must be a non-negative finite number",
                self.volume, self.date
            )));
        }

        if self.high < self.open.max(self.close).max(self.low) {
            return Err(AnalysisError::InvalidSeries(format!(
                "high {} on {} is below open/close/low",
                self.high, self.date
            )));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(AnalysisError::InvalidSeries(format!(
                "low {} on {} is above open/close/high",
                self.low, self.date
            )));
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

/// Validated, date-ordered price history for one symbol.
///
/// The only way to obtain a `PriceSeries` is through [`PriceSeries::new`] (or
/// deserialization, which runs the same checks), so every series the engines
/// see is non-empty, strictly increasing by date and made of well-formed candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl TryFrom<RawSeries> for PriceSeries {
    type Error = AnalysisError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        PriceSeries::new(raw.symbol, raw.points)
    }
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, AnalysisError> {
        let symbol = symbol.into().trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AnalysisError::InvalidSeries("symbol is empty".to_string()));
        }
        if points.is_empty() {
            return Err(AnalysisError::InvalidSeries(format!(
                "no price points for {}",
                symbol
            )));
        }

        for point in &points {
            point.validate()?;
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidSeries(format!(
                "dates must be strictly increasing: {} follows {}",
                pair[1].date, pair[0].date
            )));
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> &PricePoint {
        // Non-empty by construction.
        &self.points[self.points.len() - 1]
    }

    pub fn as_of(&self) -> NaiveDate {
        self.last().date
    }

    pub fn current_price(&self) -> f64 {
        self.last().close
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.low).collect()
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        self.points.iter().map(PricePoint::typical_price).collect()
    }

    /// Points within `period`'s lookback of the latest date.
    pub fn trailing(&self, period: Period) -> PriceSeries {
        let Some(days) = period.lookback_days() else {
            return self.clone();
        };
        let cutoff = self.as_of() - Duration::days(days);
        let points: Vec<PricePoint> = self
            .points
            .iter()
            .filter(|p| p.date > cutoff)
            .copied()
            .collect();

        // The last point always survives the cutoff, so the subset stays valid.
        PriceSeries {
            symbol: self.symbol.clone(),
            points,
        }
    }
}

/// Point-in-time financial statement figures.
///
/// Every field is optional: an absent figure is missing, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialSnapshot {
    pub share_price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub revenue: Option<f64>,
    pub prior_revenue: Option<f64>,
    pub cost_of_revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub prior_net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_equity: Option<f64>,
    pub total_debt: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub inventory: Option<f64>,
    pub receivables: Option<f64>,
    pub cash: Option<f64>,
    pub dividends_per_share: Option<f64>,
    pub prior_dividends_per_share: Option<f64>,
}

impl FinancialSnapshot {
    /// Cost of revenue, falling back to revenue minus gross profit.
    pub fn cogs(&self) -> Option<f64> {
        self.cost_of_revenue
            .or_else(|| Some(self.revenue? - self.gross_profit?))
    }

    /// Share price times shares outstanding
    pub fn market_cap(&self) -> Option<f64> {
        Some(self.share_price? * self.shares_outstanding?)
    }
}
