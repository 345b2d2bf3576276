use crate::wire::{read_json, ProductsResponse};
use crate::UpstreamConfig;
use async_trait::async_trait;
use candle_core::upstream::{InstrumentPage, InstrumentPageRequest};
use candle_core::{InstrumentDirectory, Result};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, warn};

const SERVICE: &str = "product service";

/// [`InstrumentDirectory`] over the product service's `GET /products`
#[derive(Debug, Clone)]
pub struct HttpInstrumentDirectory {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl HttpInstrumentDirectory {
    pub fn new(client: Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.product_service_url.clone(),
            page_size: config.product_page_size,
        }
    }

    fn query_params(request: &InstrumentPageRequest) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(request.ids.len() + 3);
        if let Some(status) = request.status {
            params.push(("status", status.as_str().to_string()));
        }
        for id in &request.ids {
            params.push(("id", id.to_string()));
        }
        params.push(("page", request.page.to_string()));
        params.push(("page_size", request.page_size.to_string()));
        params
    }
}

#[async_trait]
impl InstrumentDirectory for HttpInstrumentDirectory {
    async fn fetch_page(&self, request: &InstrumentPageRequest) -> Result<InstrumentPage> {
        let started = Instant::now();
        let sent = self
            .client
            .get(format!("{}/products", self.base_url))
            .query(&Self::query_params(request))
            .send()
            .await;
        let body: ProductsResponse = read_json(SERVICE, sent).await?;
        candle_metrics::histograms::upstream_request_duration(started.elapsed(), "list_products");

        let mut instrument_ids = Vec::with_capacity(body.products.len());
        for product in &body.products {
            match product.id.as_u64() {
                Some(id) => instrument_ids.push(id),
                None => warn!(id = ?product.id, "Product with non-numeric id ignored"),
            }
        }

        let total_count = body.pagination.map(|p| p.total_count);

        debug!(
            page = request.page,
            fetched = instrument_ids.len(),
            total_count = ?total_count,
            "Product page received"
        );
        Ok(InstrumentPage {
            instrument_ids,
            total_count,
        })
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::CandleError;
    use std::collections::BTreeSet;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer, page_size: u32) -> HttpInstrumentDirectory {
        let mut config = UpstreamConfig::new(server.uri(), server.uri());
        config.product_page_size = page_size;
        HttpInstrumentDirectory::new(config.http_client().unwrap(), &config)
    }

    fn page(ids: &[serde_json::Value], total: u64) -> ResponseTemplate {
        let products: Vec<serde_json::Value> =
            ids.iter().map(|id| serde_json::json!({ "id": id })).collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": products,
            "pagination": { "page": 1, "page_size": 2, "total_count": total }
        }))
    }

    #[tokio::test]
    async fn test_lists_all_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("status", "enabled"))
            .and(query_param("page", "1"))
            .respond_with(page(&[serde_json::json!(3), serde_json::json!(1)], 3))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("page", "2"))
            .respond_with(page(&[serde_json::json!("8")], 3))
            .mount(&server)
            .await;

        let ids = directory(&server, 2).list_active_ids().await.unwrap();
        assert_eq!(ids, BTreeSet::from([1, 3, 8]));
    }

    #[tokio::test]
    async fn test_find_unknown_sends_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("id", "4"))
            .respond_with(page(&[serde_json::json!(4)], 1))
            .mount(&server)
            .await;

        let unknown = directory(&server, 100)
            .find_unknown(&BTreeSet::from([4, 5]))
            .await
            .unwrap();
        assert_eq!(unknown, BTreeSet::from([5]));
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = directory(&server, 100).list_active_ids().await.unwrap_err();
        assert!(matches!(err, CandleError::Upstream(ref m) if m.contains("503")));
    }
}
