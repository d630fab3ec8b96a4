use std::sync::Arc;

use analysis_core::{AnalysisError, FundamentalReport, Period, TechnicalReport};
use fundamental_analysis::FundamentalAnalysisEngine;
use serde::Serialize;
use technical_analysis::TechnicalAnalysisEngine;

pub mod cache;
pub mod config;
pub mod provider;

pub use cache::{CacheKey, ReportCache, CACHE_TTL_SECS};
pub use config::ServiceConfig;
pub use provider::{JsonFileProvider, MarketDataProvider};

/// Technical and fundamental view of one symbol
#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    pub symbol: String,
    pub period: Period,
    pub technical: Option<TechnicalReport>,
    pub fundamental: Option<FundamentalReport>,
}

/// Fetches inputs from a provider, runs both engines and caches the reports.
pub struct AnalysisService {
    provider: Arc<dyn MarketDataProvider>,
    technical_analyzer: TechnicalAnalysisEngine,
    fundamental_analyzer: FundamentalAnalysisEngine,
    technical_cache: ReportCache<TechnicalReport>,
    fundamental_cache: ReportCache<FundamentalReport>,
    default_period: Period,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::with_engines(
            provider,
            TechnicalAnalysisEngine::new(),
            FundamentalAnalysisEngine::new(),
            &ServiceConfig::default(),
        )
    }

    pub fn from_config(
        provider: Arc<dyn MarketDataProvider>,
        config: &ServiceConfig,
    ) -> Result<Self, AnalysisError> {
        let fundamental = FundamentalAnalysisEngine::with_config(config.health.clone())?;
        Ok(Self::with_engines(provider, TechnicalAnalysisEngine::new(), fundamental, config))
    }

    pub fn with_engines(
        provider: Arc<dyn MarketDataProvider>,
        technical_analyzer: TechnicalAnalysisEngine,
        fundamental_analyzer: FundamentalAnalysisEngine,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            provider,
            technical_analyzer,
            fundamental_analyzer,
            technical_cache: ReportCache::new(config.cache_ttl),
            fundamental_cache: ReportCache::new(config.cache_ttl),
            default_period: config.default_period,
        }
    }

    pub fn default_period(&self) -> Period {
        self.default_period
    }

    pub async fn technical_report(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Arc<TechnicalReport>, AnalysisError> {
        let version = self.provider.data_version(symbol).await;
        let key = CacheKey::new(symbol, Some(period), version);

        self.technical_cache
            .get_or_compute(key, move || async move {
                let series = self
                    .provider
                    .price_series(symbol, period)
                    .await
                    .inspect_err(|e| {
                        tracing::warn!("Failed to fetch prices for {}: {}", symbol, e)
                    })?;
                tracing::info!(
                    "Running technical analysis for {} ({}, {} bars)",
                    symbol,
                    period,
                    series.len()
                );
                Ok(self.technical_analyzer.evaluate(&series))
            })
            .await
    }

    pub async fn fundamental_report(
        &self,
        symbol: &str,
    ) -> Result<Arc<FundamentalReport>, AnalysisError> {
        let version = self.provider.data_version(symbol).await;
        let key = CacheKey::new(symbol, None, version);

        self.fundamental_cache
            .get_or_compute(key, move || async move {
                let snapshot = self
                    .provider
                    .financial_snapshot(symbol)
                    .await
                    .inspect_err(|e| {
                        tracing::warn!("Failed to fetch financials for {}: {}", symbol, e)
                    })?;
                tracing::info!("Running fundamental analysis for {}", symbol);
                Ok(self.fundamental_analyzer.evaluate(symbol, &snapshot))
            })
            .await
    }

    /// Runs both analyses concurrently. A missing half is reported as `None`;
    /// the call fails only when neither half is available.
    pub async fn full_report(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<FullReport, AnalysisError> {
        let (technical, fundamental) = tokio::join!(
            self.technical_report(symbol, period),
            self.fundamental_report(symbol)
        );

        let (technical, fundamental) = match (technical, fundamental) {
            (Err(e), Err(_)) => return Err(e),
            (t, f) => (
                t.ok().map(|r| (*r).clone()),
                f.ok().map(|r| (*r).clone()),
            ),
        };

        Ok(FullReport {
            symbol: symbol.trim().to_uppercase(),
            period,
            technical,
            fundamental,
        })
    }

    /// Drops cached reports for `symbol`.
    pub fn invalidate(&self, symbol: &str) {
        self.technical_cache.invalidate(symbol);
        self.fundamental_cache.invalidate(symbol);
    }

    pub fn purge_expired(&self) {
        self.technical_cache.purge_expired();
        self.fundamental_cache.purge_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{FinancialSnapshot, PricePoint, PriceSeries, Sentiment};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubProvider {
        price_calls: AtomicUsize,
        snapshot_calls: AtomicUsize,
        version: AtomicUsize,
        with_financials: bool,
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        async fn price_series(
            &self,
            symbol: &str,
            period: Period,
        ) -> Result<PriceSeries, AnalysisError> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            if symbol.eq_ignore_ascii_case("MISSING") {
                return Err(AnalysisError::DataUnavailable(format!("no prices for {}", symbol)));
            }
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let points = (0..60)
                .map(|i| {
                    let close = 100.0 + i as f64;
                    PricePoint {
                        date: start + Duration::days(i),
                        open: close,
                        high: close + 0.5,
                        low: close - 0.5,
                        close,
                        volume: 10_000.0,
                    }
                })
                .collect();
            Ok(PriceSeries::new(symbol, points)?.trailing(period))
        }

        async fn financial_snapshot(
            &self,
            symbol: &str,
        ) -> Result<FinancialSnapshot, AnalysisError> {
            self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
            if !self.with_financials {
                return Err(AnalysisError::DataUnavailable(format!("no financials for {}", symbol)));
            }
            Ok(FinancialSnapshot {
                net_income: Some(50.0),
                total_equity: Some(250.0),
                ..Default::default()
            })
        }

        async fn data_version(&self, _symbol: &str) -> u64 {
            self.version.load(Ordering::SeqCst) as u64
        }
    }

    fn service(provider: Arc<StubProvider>) -> AnalysisService {
        AnalysisService::new(provider)
    }

    #[tokio::test]
    async fn test_from_config_carries_settings() {
        let config = ServiceConfig {
            default_period: Period::SixMonths,
            ..ServiceConfig::default()
        };
        let service = AnalysisService::from_config(Arc::new(StubProvider::default()), &config);
        assert_eq!(service.unwrap().default_period(), Period::SixMonths);

        let mut invalid = ServiceConfig::default();
        invalid.health.components.clear();
        let result = AnalysisService::from_config(Arc::new(StubProvider::default()), &invalid);
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_technical_report_is_cached() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        let first = service.technical_report("aapl", Period::Max).await.unwrap();
        let second = service.technical_report("AAPL", Period::Max).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.overall_sentiment, Sentiment::Bullish);
        assert_eq!(provider.price_calls.load(Ordering::SeqCst), 1);

        service.technical_report("AAPL", Period::OneMonth).await.unwrap();
        assert_eq!(provider.price_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_new_data_version_recomputes() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        service.technical_report("AAPL", Period::Max).await.unwrap();
        provider.version.store(1, Ordering::SeqCst);
        service.technical_report("AAPL", Period::Max).await.unwrap();
        assert_eq!(provider.price_calls.load(Ordering::SeqCst), 2);

        service.invalidate("aapl");
        service.technical_report("AAPL", Period::Max).await.unwrap();
        assert_eq!(provider.price_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_full_report_tolerates_missing_half() {
        let provider = Arc::new(StubProvider::default());
        let service = service(Arc::clone(&provider));

        let report = service.full_report("msft", Period::OneYear).await.unwrap();
        assert_eq!(report.symbol, "MSFT");
        assert!(report.technical.is_some());
        assert!(report.fundamental.is_none());

        let err = service.full_report("missing", Period::OneYear).await;
        assert!(matches!(err, Err(AnalysisError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_full_report_with_financials() {
        let provider = Arc::new(StubProvider {
            with_financials: true,
            ..Default::default()
        });
        let service = service(Arc::clone(&provider));

        let report = service.full_report("MSFT", Period::Max).await.unwrap();
        let fundamental = report.fundamental.unwrap();
        assert!((fundamental.metrics.profitability.roe.unwrap() - 0.2).abs() < 1e-12);
        assert!(fundamental.health_score.is_some());

        service.fundamental_report("msft").await.unwrap();
        assert_eq!(provider.snapshot_calls.load(Ordering::SeqCst), 1);

        let report = service.full_report("MSFT", Period::Max).await.unwrap();
        let wire = serde_json::to_value(report).unwrap();
        assert_eq!(wire["period"], "max");
        assert_eq!(wire["technical"]["overall_sentiment"], "bullish");
    }
}
