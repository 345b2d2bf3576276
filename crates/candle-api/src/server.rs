use crate::config::ApiConfig;
use crate::schema::{build_schema, ApiSchema};
use crate::service::CandleService;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::HeaderValue,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// HTTP front for the candle GraphQL schema
pub struct ApiServer {
    config: ApiConfig,
    schema: ApiSchema,
}

impl ApiServer {
    pub fn new(config: ApiConfig, service: Arc<CandleService>) -> Self {
        let schema = build_schema(service);
        Self { config, schema }
    }

    fn cors(&self) -> CorsLayer {
        if !self.config.cors_enabled {
            return CorsLayer::new();
        }

        let origin = match self.config.allowed_origins() {
            Some(origins) => {
                let values: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match o.parse() {
                        Ok(value) => Some(value),
                        Err(_) => {
                            warn!(origin = %o, "Ignoring invalid CORS origin");
                            None
                        }
                    })
                    .collect();
                AllowOrigin::list(values)
            }
            None => AllowOrigin::any(),
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(graphiql).post(graphql_handler))
            .route("/graphql", get(graphiql).post(graphql_handler))
            .route("/health", get(health_check))
            .with_state(self.schema.clone())
            .layer(self.cors())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn serve<F>(self, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::ApiError::Server(format!("bind {}: {}", addr, e)))?;
        info!(address = %addr, "Candle GraphQL API listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| crate::ApiError::Server(e.to_string()))?;

        info!("Candle GraphQL API stopped");
        Ok(())
    }
}

async fn graphql_handler(
    State(schema): State<ApiSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

/// GraphiQL playground
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "candle-api" }))
}
