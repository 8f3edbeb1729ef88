use std::sync::Arc;
use std::time::Duration;

use proxylink_api::handlers;
use proxylink_api::state::AppState;
use proxylink_api::store::{DocumentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = proxylink_api::config::config();
    tracing::info!("Starting ProxyLink API in {:?} mode", config.environment);

    // The store client is built here and injected; its lifecycle belongs
    // to the process entry point.
    let store: Arc<dyn DocumentStore> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PgStore::connect(
                &url,
                config.store.max_connections,
                Duration::from_secs(config.store.connection_timeout_secs),
            )
            .await
            .unwrap_or_else(|e| panic!("failed to connect document store: {e}"));

            store
                .ensure_schema()
                .await
                .unwrap_or_else(|e| panic!("failed to prepare document store schema: {e}"));
            Arc::new(store)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; serving from a volatile in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let app = handlers::router(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("ProxyLink API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
