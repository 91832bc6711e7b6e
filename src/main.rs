use instance_diff::config::AppConfig;
use instance_diff::store::{InMemoryStore, PayloadCache, PostgresStore, TypeRegistry};
use instance_diff::{build_app, seed, serve_app};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress sqlx debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    log::info!("instance-diff: comparison and migration server");

    // Load configuration
    let config = AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let cache = Arc::new(PayloadCache::new(config.payload_ttl()));
    cache.clone().spawn_cleanup(config.payload_ttl().max(Duration::from_secs(1)));
    let registry = Arc::new(TypeRegistry::new());

    // Load demo payloads (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        seed::load_seed_data(&cache).await;
    }

    let app = match config.database_url() {
        Some(database_url) => {
            log::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;
            store.migrate().await?;
            build_app(Arc::new(store), cache, registry)
        }
        None => {
            log::warn!("No database configured; sessions are kept in memory only");
            build_app(Arc::new(InMemoryStore::new()), cache, registry)
        }
    };

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("instance-diff server running on http://{}", bind_address);

    serve_app(app, listener).await
}
