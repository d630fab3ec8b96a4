use std::sync::Arc;

use analysis_core::Period;
use analysis_service::{AnalysisService, JsonFileProvider, ServiceConfig};
use anyhow::{bail, Context, Result};

const USAGE: &str = "usage: stock-analysis <data-dir> <SYMBOL> [period]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env()?;
    init_tracing(config.json_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (data_dir, symbol) = match args.as_slice() {
        [dir, symbol, ..] => (dir.clone(), symbol.clone()),
        _ => bail!(USAGE),
    };

    let provider = Arc::new(JsonFileProvider::new(&data_dir));
    let service = AnalysisService::from_config(provider, &config)
        .context("Invalid analysis configuration")?;

    let period: Period = match args.get(2) {
        Some(p) => p.parse().with_context(|| format!("Invalid period '{}'", p))?,
        None => service.default_period(),
    };

    tracing::info!("Analyzing {} over {} from {}", symbol, period, data_dir);

    let report = service
        .full_report(&symbol, period)
        .await
        .with_context(|| format!("Analysis failed for {}", symbol))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(json_logging: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so stdout stays valid JSON.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
