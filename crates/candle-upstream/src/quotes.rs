use crate::wire::{read_json, QuotesRequest, QuotesResponse};
use crate::UpstreamConfig;
use async_trait::async_trait;
use candle_core::types::{InstrumentQuotes, TIME_OF_DAY_FORMAT};
use candle_core::{QuoteSource, Result};
use chrono::NaiveTime;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

const SERVICE: &str = "quote service";

/// [`QuoteSource`] over the quote service's `POST /quotes`
#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    client: Client,
    base_url: String,
}

impl HttpQuoteSource {
    pub fn new(client: Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.quote_service_url.clone(),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn get_quotes(
        &self,
        instrument_ids: &[u64],
        from: NaiveTime,
        to: NaiveTime,
    ) -> Result<Vec<InstrumentQuotes>> {
        let request = QuotesRequest {
            product_ids: instrument_ids,
            from: from.format(TIME_OF_DAY_FORMAT).to_string(),
            to: to.format(TIME_OF_DAY_FORMAT).to_string(),
            include_latest: true,
        };

        let started = Instant::now();
        let sent = self
            .client
            .post(format!("{}/quotes", self.base_url))
            .json(&request)
            .send()
            .await;
        let body: QuotesResponse = read_json(SERVICE, sent).await?;
        candle_metrics::histograms::upstream_request_duration(started.elapsed(), "get_quotes");

        let mut quotes = Vec::with_capacity(body.quotes.len());
        for entry in body.quotes {
            let Some(instrument_id) = entry.product_id.as_u64() else {
                warn!(id = ?entry.product_id, "Quotes for non-numeric product id ignored");
                continue;
            };
            quotes.push(InstrumentQuotes {
                instrument_id,
                quotes: entry
                    .quotes
                    .into_iter()
                    .map(|(key, price)| (key, price.into_string()))
                    .collect(),
            });
        }

        debug!(
            requested = instrument_ids.len(),
            received = quotes.len(),
            from = %request.from,
            to = %request.to,
            "Quotes received"
        );
        Ok(quotes)
    }
}
