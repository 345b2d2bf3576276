pub mod config;
pub mod schema;
pub mod server;
pub mod service;

pub use config::ApiConfig;
pub use server::ApiServer;
pub use service::{CandleChart, CandlePage, CandleService, CandleStick, GetCandlesRequest};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
