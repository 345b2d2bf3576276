use crate::config::MetricsConfig;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// Metrics HTTP Server
pub struct MetricsServer {
    config: MetricsConfig,
    handle: PrometheusHandle,
}

impl MetricsServer {
    pub fn new(config: MetricsConfig, handle: PrometheusHandle) -> Self {
        Self { config, handle }
    }

    /// Serve `/metrics` and `/health` until the listener fails
    pub async fn run(self) -> crate::Result<()> {
        let addr = self.config.address();
        let handle = self.handle;

        let app = Router::new()
            .route("/metrics", get(move || metrics_handler(handle.clone())))
            .route("/health", get(health_handler));

        info!(address = %addr, "Starting metrics server");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::MetricsError::Server(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| crate::MetricsError::Server(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler(handle: PrometheusHandle) -> String {
    handle.render()
}

async fn health_handler() -> &'static str {
    "OK"
}
