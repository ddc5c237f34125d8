use std::sync::Arc;

use event_store::{EventStore, LoggingMiddleware, StoreConfig};
use event_store_client::http_client::ReqwestEventStoreClient;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Configure logging from env var `EVENT_STORE_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = std::env::var("EVENT_STORE_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("{log_env},hyper=warn"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::info!("event_store: log filter: {}", log_env);

    let config = StoreConfig::from_env()?;
    tracing::info!(
        base_url = %config.client.base_url,
        timezone = ?config.timezone,
        "event_store: configuration loaded"
    );

    let client = LoggingMiddleware::new(ReqwestEventStoreClient::from_config(&config.client));
    let store = EventStore::new(Arc::new(client), config.offset_source());

    let count = store.initial_load().await?;
    tracing::info!("event_store: {} events loaded", count);

    println!("{}", serde_json::to_string_pretty(&store.events())?);
    Ok(())
}
