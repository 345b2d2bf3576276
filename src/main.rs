use candle_aggregator::{CandleJob, CandleScheduler};
use candle_api::{ApiConfig, ApiServer, CandleService};
use candle_core::{AggregationConfig, CandleStore, InstrumentDirectory};
use candle_db::{DatabaseConfig, DatabasePool, PgCandleStore};
use candle_metrics::{MetricsConfig, MetricsServer};
use candle_store::MemoryCandleStore;
use candle_upstream::{HttpInstrumentDirectory, HttpQuoteSource, UpstreamConfig};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("candle_aggregator=info".parse()?),
        )
        .init();

    info!("Candle service starting...");

    let aggregation_config = AggregationConfig::from_env()?;
    let upstream_config = UpstreamConfig::from_env()?;
    let api_config = ApiConfig::from_env()?;
    info!(
        interval = %aggregation_config.interval,
        aggregation_enabled = aggregation_config.enabled,
        missing_latest = ?aggregation_config.missing_latest,
        product_service = %upstream_config.product_service_url,
        quote_service = %upstream_config.quote_service_url,
        "Configuration loaded"
    );

    // Metrics recorder goes in before anything records
    if let Some(metrics_config) = MetricsConfig::from_env()? {
        let handle = candle_metrics::init()?;
        let metrics_server = MetricsServer::new(metrics_config, handle);
        tokio::spawn(async move {
            if let Err(e) = metrics_server.run().await {
                error!(error = %e, "Metrics server error");
            }
        });
        info!("Metrics server started");
    }

    // Persistence: PostgreSQL when DATABASE_URL is set, memory otherwise
    let (db_pool, store): (Option<Arc<DatabasePool>>, Arc<dyn CandleStore>) =
        if DatabaseConfig::requested() {
            let db_config = DatabaseConfig::from_env()?;
            let pool = Arc::new(DatabasePool::connect(&db_config).await?);
            pool.migrate().await?;
            let latency = pool.ping().await?;
            info!(
                latency_ms = latency.as_millis() as u64,
                "Database connected and migrations applied"
            );
            let store: Arc<dyn CandleStore> = Arc::new(PgCandleStore::new(pool.clone(), &db_config));
            (Some(pool), store)
        } else {
            warn!("DATABASE_URL not set, candles are kept in memory only");
            let store: Arc<dyn CandleStore> = Arc::new(MemoryCandleStore::new());
            (None, store)
        };

    let client = upstream_config.http_client()?;
    let directory: Arc<dyn InstrumentDirectory> =
        Arc::new(HttpInstrumentDirectory::new(client.clone(), &upstream_config));
    let quotes = Arc::new(HttpQuoteSource::new(client, &upstream_config));

    let mut scheduler = if aggregation_config.enabled {
        let job = CandleJob::new(directory.clone(), quotes, store.clone(), &aggregation_config);
        let mut scheduler = CandleScheduler::new(Arc::new(job), aggregation_config.tick_delay_secs);
        scheduler.start();
        Some(scheduler)
    } else {
        warn!("Scheduled candle aggregation disabled");
        None
    };

    let service = Arc::new(CandleService::new(
        store,
        directory,
        api_config.max_page_size,
    ));
    let (api_shutdown_tx, api_shutdown_rx) = oneshot::channel::<()>();
    let api_server = ApiServer::new(api_config, service);
    let api_task = tokio::spawn(async move {
        let shutdown = async {
            let _ = api_shutdown_rx.await;
        };
        if let Err(e) = api_server.serve(shutdown).await {
            error!(error = %e, "API server error");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received (Ctrl+C)");

    let _ = api_shutdown_tx.send(());
    if let Err(e) = api_task.await {
        error!(error = %e, "API server task panicked");
    }

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await;
    }

    if let Some(db) = db_pool {
        db.close().await;
        info!("Database connections closed");
    }

    info!("Candle service shutdown complete");
    Ok(())
}
