use crate::{AnalysisError, FinancialSnapshot, FundamentalReport, PriceSeries, TechnicalReport};

/// Trait for technical analysis engines
pub trait TechnicalAnalyzer: Send + Sync {
    fn analyze(&self, series: &PriceSeries) -> Result<TechnicalReport, AnalysisError>;
}

/// Trait for fundamental analysis engines
pub trait FundamentalAnalyzer: Send + Sync {
    fn analyze(
        &self,
        symbol: &str,
        snapshot: &FinancialSnapshot,
    ) -> Result<FundamentalReport, AnalysisError>;
}
