use thiserror::Error;

#[derive(Error, Debug)]
pub enum CandleError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Instrument {0} has no latest quote")]
    MissingLatest(u64),

    #[error("No such instrument: {0:?}")]
    NoSuchInstrument(Vec<u64>),

    #[error("Interval {0} cannot be aggregated from time-of-day samples")]
    UnsupportedInterval(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CandleError {
    /// Short label used for the `type` dimension of error metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CandleError::MissingEnvVar(_) | CandleError::Config(_) => "config",
            CandleError::Upstream(_) => "upstream",
            CandleError::MissingLatest(_) => "missing_latest",
            CandleError::NoSuchInstrument(_) => "no_such_instrument",
            CandleError::UnsupportedInterval(_) => "unsupported_interval",
            CandleError::InvalidInput(_) => "invalid_input",
            CandleError::Storage(_) => "storage",
        }
    }
}

pub type Result<T> = std::result::Result<T, CandleError>;
