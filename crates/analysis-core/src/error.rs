use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
