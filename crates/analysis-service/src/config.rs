use analysis_core::Period;
use anyhow::{Context, Result};
use fundamental_analysis::HealthConfig;
use std::env;
use std::time::Duration;

use crate::cache::CACHE_TTL_SECS;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub cache_ttl: Duration,
    pub default_period: Period,
    pub health: HealthConfig,
    pub json_logging: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let cache_ttl_secs: u64 = env::var("ANALYSIS_CACHE_TTL_SECS")
            .unwrap_or_else(|_| CACHE_TTL_SECS.to_string())
            .parse()
            .context("ANALYSIS_CACHE_TTL_SECS must be a whole number of seconds")?;

        let default_period: Period = env::var("ANALYSIS_DEFAULT_PERIOD")
            .unwrap_or_else(|_| Period::default().to_string())
            .parse()
            .context("ANALYSIS_DEFAULT_PERIOD is not a valid period")?;

        let health = match env::var("ANALYSIS_HEALTH_CONFIG") {
            Ok(path) => load_health_config(&path)?,
            Err(_) => HealthConfig::default(),
        };

        let json_logging = env::var("RUST_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            default_period,
            health,
            json_logging,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            default_period: Period::default(),
            health: HealthConfig::default(),
            json_logging: false,
        }
    }
}

pub fn load_health_config(path: &str) -> Result<HealthConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read health config {}", path))?;
    let config: HealthConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse health config {}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid health config {}", path))?;
    Ok(config)
}
