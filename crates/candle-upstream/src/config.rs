use crate::UpstreamError;
use candle_core::config::{parse_env, required_env};
use candle_core::upstream::DEFAULT_DIRECTORY_PAGE_SIZE;
use candle_core::Result;
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the product (instrument directory) service
    pub product_service_url: String,
    /// Base URL of the quote service
    pub quote_service_url: String,
    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Page size when listing instruments (default: 3000)
    pub product_page_size: u32,
}

impl UpstreamConfig {
    pub fn new(product_service_url: impl Into<String>, quote_service_url: impl Into<String>) -> Self {
        Self {
            product_service_url: trim_base(product_service_url.into()),
            quote_service_url: trim_base(quote_service_url.into()),
            timeout_secs: 10,
            product_page_size: DEFAULT_DIRECTORY_PAGE_SIZE,
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required_env("PRODUCT_SERVICE_URL")?,
            required_env("QUOTE_SERVICE_URL")?,
        );
        if let Some(timeout) = parse_env("UPSTREAM_TIMEOUT_SECS")? {
            config.timeout_secs = timeout;
        }
        if let Some(page_size) = parse_env::<u32>("PRODUCT_PAGE_SIZE")? {
            config.product_page_size = page_size.max(1);
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client shared by both upstream services
    pub fn http_client(&self) -> std::result::Result<Client, UpstreamError> {
        Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
