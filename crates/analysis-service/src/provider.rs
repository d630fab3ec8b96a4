use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use analysis_core::{AnalysisError, FinancialSnapshot, Period, PricePoint, PriceSeries};
use async_trait::async_trait;
use serde::Deserialize;

/// Source of price history and financial statements.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn price_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<PriceSeries, AnalysisError>;

    async fn financial_snapshot(&self, symbol: &str) -> Result<FinancialSnapshot, AnalysisError>;

    /// Changes whenever the underlying data for `symbol` changes.
    async fn data_version(&self, _symbol: &str) -> u64 {
        0
    }
}

/// On-disk layout of `<SYMBOL>.json`
#[derive(Debug, Deserialize)]
struct SymbolFile {
    prices: Vec<PricePoint>,
    #[serde(default)]
    financials: Option<FinancialSnapshot>,
}

/// Reads `<dir>/<SYMBOL>.json` files holding `{"prices": [...], "financials": {...}}`.
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> Result<PathBuf, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
            && !symbol.starts_with('.');
        if !valid {
            return Err(AnalysisError::DataUnavailable(format!("invalid symbol '{}'", symbol)));
        }
        Ok(self.dir.join(format!("{}.json", symbol)))
    }

    async fn load(&self, symbol: &str) -> Result<SymbolFile, AnalysisError> {
        let path = self.path_for(symbol)?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalysisError::DataUnavailable(format!("no data file for {}", symbol))
            } else {
                AnalysisError::Provider(format!("failed to read {}: {}", path.display(), e))
            }
        })?;

        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::Provider(format!("malformed {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl MarketDataProvider for JsonFileProvider {
    async fn price_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<PriceSeries, AnalysisError> {
        let file = self.load(symbol).await?;
        let series = PriceSeries::new(symbol, file.prices)?;
        Ok(series.trailing(period))
    }

    async fn financial_snapshot(&self, symbol: &str) -> Result<FinancialSnapshot, AnalysisError> {
        self.load(symbol)
            .await?
            .financials
            .ok_or_else(|| AnalysisError::DataUnavailable(format!("no financials for {}", symbol)))
    }

    /// File modification time in nanoseconds, so edits invalidate cached reports.
    async fn data_version(&self, symbol: &str) -> u64 {
        let Ok(path) = self.path_for(symbol) else {
            return 0;
        };
        tokio::fs::metadata(&path)
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}
