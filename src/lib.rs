pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{CompareError, MigrationError};

// Export engine entry points
pub use logic::{ComparisonEngine, MigrationBuilder, SessionAssembler};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryStore, PayloadCache, PostgresStore, SessionStore, TypeRegistry};

use std::sync::Arc;

/// Build the HTTP application over the given session store
pub fn build_app<S: SessionStore + 'static>(
    store: Arc<S>,
    cache: Arc<PayloadCache>,
    registry: Arc<TypeRegistry>,
) -> axum::Router {
    crate::api::routes::create_router::<S>()
        .with_state(crate::api::handlers::AppState::new(store, cache, registry))
}

/// Serve the application until the listener fails
pub async fn serve_app(app: axum::Router, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}
