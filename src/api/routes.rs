use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::api::handlers::{self, AppState};
use crate::api::session_handlers;
use crate::store::SessionStore;

pub fn create_router<S: SessionStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Comparison type registry
        .route(
            "/comparison-types",
            get(handlers::list_comparison_types::<S>)
                .post(handlers::upsert_comparison_type::<S>),
        )
        .route(
            "/comparison-types/:type_id",
            axum::routing::delete(handlers::delete_comparison_type::<S>),
        )
        // Fetched payloads per instance
        .route(
            "/instances/:instance_id/payload",
            put(handlers::put_instance_payload::<S>)
                .get(handlers::get_instance_payload::<S>)
                .delete(handlers::delete_instance_payload::<S>),
        )
        // Comparison runs
        .route("/comparisons", post(handlers::create_comparison::<S>))
        // Sessions
        .route("/sessions", get(session_handlers::list_sessions::<S>))
        .route("/sessions/active", get(session_handlers::get_active_session::<S>))
        .route(
            "/sessions/:session_id",
            get(session_handlers::get_session::<S>)
                .delete(session_handlers::delete_session::<S>),
        )
        .route(
            "/sessions/:session_id/active",
            put(session_handlers::activate_session::<S>),
        )
        .route(
            "/sessions/:session_id/migration",
            post(session_handlers::create_migration_plan::<S>),
        )
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}
