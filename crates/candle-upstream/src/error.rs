use candle_core::CandleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{service} request failed: {message}")]
    Transport { service: &'static str, message: String },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: &'static str, message: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl From<UpstreamError> for CandleError {
    fn from(err: UpstreamError) -> Self {
        CandleError::Upstream(err.to_string())
    }
}
