use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::api::handlers::{api_error, internal_error, ApiError, AppState};
use crate::error::MigrationError;
use crate::logic::MigrationBuilder;
use crate::model::{ComparisonSession, Id, MigrationPlan, MigrationRequest, SessionSummary};
use crate::store::SessionStore;

/// GET /sessions
/// List sessions in creation order, without their result rows
pub async fn list_sessions<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state.store.list_sessions().await.map_err(internal_error)?;
    let active_id = state
        .store
        .get_active_session()
        .await
        .map_err(internal_error)?
        .map(|s| s.id);

    Ok(Json(
        sessions
            .iter()
            .map(|s| s.listing(active_id.as_ref() == Some(&s.id)))
            .collect(),
    ))
}

/// GET /sessions/active
pub async fn get_active_session<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ComparisonSession>, ApiError> {
    match state.store.get_active_session().await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "No active session")),
        Err(e) => Err(internal_error(e)),
    }
}

/// GET /sessions/{session_id}
pub async fn get_session<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Id>,
) -> Result<Json<ComparisonSession>, ApiError> {
    match state.store.get_session(&session_id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Session not found")),
        Err(e) => Err(internal_error(e)),
    }
}

/// DELETE /sessions/{session_id}
pub async fn delete_session<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    match state.store.delete_session(&session_id).await {
        Ok(true) => {
            log::info!("Deleted session {}", session_id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "Session not found")),
        Err(e) => Err(internal_error(e)),
    }
}

/// PUT /sessions/{session_id}/active
pub async fn activate_session<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Id>,
) -> Result<Json<ComparisonSession>, ApiError> {
    match state.store.set_active_session(&session_id).await {
        Ok(true) => {}
        Ok(false) => return Err(api_error(StatusCode::NOT_FOUND, "Session not found")),
        Err(e) => return Err(internal_error(e)),
    }

    get_session(State(state), Path(session_id)).await
}

/// POST /sessions/{session_id}/migration
/// Build the write-back payload for pushing selected units between instances
pub async fn create_migration_plan<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<Id>,
    Json(req): Json<MigrationRequest>,
) -> Result<Json<MigrationPlan>, ApiError> {
    let session = match state.store.get_session(&session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return Err(api_error(StatusCode::NOT_FOUND, "Session not found")),
        Err(e) => return Err(internal_error(e)),
    };

    let current_source = state
        .cache
        .get(&req.source_instance_id)
        .await
        .map(|cached| cached.payload);

    MigrationBuilder::build_plan(&session, &req, current_source.as_ref())
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                MigrationError::UnknownInstance(_) => StatusCode::NOT_FOUND,
                MigrationError::SameInstance(_) | MigrationError::NothingToMigrate => {
                    StatusCode::BAD_REQUEST
                }
            };
            api_error(status, &e.to_string())
        })
}
