//! JSON bodies exchanged with the product and quote services.

use crate::UpstreamError;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use tracing::warn;

/// Check the status of a sent request and decode its JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    sent: reqwest::Result<reqwest::Response>,
) -> Result<T, UpstreamError> {
    let response = sent.map_err(|e| UpstreamError::Transport {
        service,
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(service, status = %status, body = %body, "Upstream returned error");
        return Err(UpstreamError::Status {
            service,
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await.map_err(|e| UpstreamError::Transport {
        service,
        message: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| UpstreamError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Identifier sent either as a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    pub(crate) fn as_u64(&self) -> Option<u64> {
        match self {
            WireId::Number(n) => Some(*n),
            WireId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Price sent either as a decimal string or a JSON number, kept as raw text
///
/// Numbers never pass through `f64`, so every digit sent survives.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(crate) struct WirePrice(Box<RawValue>);

impl WirePrice {
    /// Decimal text of the price
    ///
    /// Anything that is neither a string nor a number comes back as its JSON
    /// text and fails decimal parsing downstream.
    pub(crate) fn into_string(self) -> String {
        let raw = self.0.get();
        if raw.starts_with('"') {
            return serde_json::from_str::<String>(raw).unwrap_or_default();
        }
        if raw.contains(['e', 'E']) {
            return Decimal::from_scientific(raw)
                .map(|d| d.normalize().to_string())
                .unwrap_or_else(|_| raw.to_string());
        }
        raw.to_string()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ProductEntry>,
    pub pagination: Option<PaginationEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEntry {
    pub id: WireId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaginationEntry {
    pub total_count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuotesRequest<'a> {
    pub product_ids: &'a [u64],
    /// `HHMMSS`
    pub from: String,
    /// `HHMMSS`
    pub to: String,
    pub include_latest: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotesResponse {
    #[serde(default)]
    pub quotes: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteEntry {
    pub product_id: WireId,
    #[serde(default)]
    pub quotes: BTreeMap<String, WirePrice>,
}
