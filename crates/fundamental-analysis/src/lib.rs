pub mod health;
pub mod ratios;

pub use health::*;
pub use ratios::*;

use analysis_core::{AnalysisError, FinancialSnapshot, FundamentalAnalyzer, FundamentalReport};

pub struct FundamentalAnalysisEngine {
    health: HealthConfig,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self {
            health: HealthConfig::default(),
        }
    }

    pub fn with_config(health: HealthConfig) -> Result<Self, AnalysisError> {
        health.validate()?;
        Ok(Self { health })
    }

    pub fn health_config(&self) -> &HealthConfig {
        &self.health
    }

    /// Computes every ratio and the health score. Missing inputs only leave
    /// the affected ratios missing.
    pub fn evaluate(&self, symbol: &str, snapshot: &FinancialSnapshot) -> FundamentalReport {
        let metrics = compute_metrics(snapshot);
        let health_score = self.health.score(&metrics);

        match &health_score {
            Some(h) => tracing::debug!(
                "Fundamental analysis for {}: health {:.1} ({:?}), coverage {:.0}%",
                symbol,
                h.score,
                h.rating,
                h.coverage * 100.0
            ),
            None => tracing::debug!(
                "Fundamental analysis for {}: no scored ratios available",
                symbol
            ),
        }

        FundamentalReport {
            symbol: symbol.trim().to_uppercase(),
            metrics,
            health_score,
        }
    }
}

impl FundamentalAnalyzer for FundamentalAnalysisEngine {
    fn analyze(
        &self,
        symbol: &str,
        snapshot: &FinancialSnapshot,
    ) -> Result<FundamentalReport, AnalysisError> {
        if symbol.trim().is_empty() {
            return Err(AnalysisError::DataUnavailable("symbol is empty".to_string()));
        }
        Ok(self.evaluate(symbol, snapshot))
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
