use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CompareError;
use crate::logic::SessionAssembler;
use crate::model::{ComparisonMode, ComparisonSession, ComparisonType, InstanceId, NewComparison};
use crate::store::{CachedPayload, PayloadCache, SessionStore, TypeRegistry};

/// Shared state of every handler
pub struct AppState<S> {
    pub store: Arc<S>,
    pub cache: Arc<PayloadCache>,
    pub registry: Arc<TypeRegistry>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, cache: Arc<PayloadCache>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            store,
            cache,
            registry,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
            registry: self.registry.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

pub fn internal_error(error: anyhow::Error) -> ApiError {
    log::error!("Request failed: {:#}", error);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /comparison-types
pub async fn list_comparison_types<S: SessionStore>(
    State(state): State<AppState<S>>,
) -> Json<Vec<ComparisonType>> {
    Json(state.registry.list())
}

/// POST /comparison-types
/// Register or replace a custom comparison type
pub async fn upsert_comparison_type<S: SessionStore>(
    State(state): State<AppState<S>>,
    Json(custom): Json<ComparisonType>,
) -> Result<(StatusCode, Json<ComparisonType>), ApiError> {
    state
        .registry
        .upsert_custom(custom)
        .map(|stored| (StatusCode::CREATED, Json(stored)))
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))
}

/// DELETE /comparison-types/{type_id}
pub async fn delete_comparison_type<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(type_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.registry.remove_custom(&type_id) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "Comparison type not found")),
        Err(e) => Err(api_error(StatusCode::BAD_REQUEST, &e.to_string())),
    }
}

/// PUT /instances/{instance_id}/payload
/// Store the latest fetched payload of an instance
pub async fn put_instance_payload<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(instance_id): Path<InstanceId>,
    Json(payload): Json<Value>,
) -> Result<Json<CachedPayload>, ApiError> {
    state.cache.put(&instance_id, payload).await;
    state
        .cache
        .get(&instance_id)
        .await
        .map(Json)
        .ok_or_else(|| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Payload expired immediately",
            )
        })
}

/// GET /instances/{instance_id}/payload
pub async fn get_instance_payload<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(instance_id): Path<InstanceId>,
) -> Result<Json<CachedPayload>, ApiError> {
    state
        .cache
        .get(&instance_id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No cached payload for instance"))
}

/// DELETE /instances/{instance_id}/payload
/// Drop a cached payload, e.g. after its fetch failed
pub async fn delete_instance_payload<S: SessionStore>(
    State(state): State<AppState<S>>,
    Path(instance_id): Path<InstanceId>,
) -> StatusCode {
    if state.cache.invalidate(&instance_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunComparisonRequest {
    pub name: Option<String>,
    /// Registered comparison type; ignored when `mode` is given
    pub type_id: Option<String>,
    pub mode: Option<ComparisonMode>,
    pub instance_ids: Vec<InstanceId>,
    pub base_instance_id: Option<InstanceId>,
    pub endpoint: Option<String>,
    /// Inline payloads; the cached payloads are used when absent
    pub payloads: Option<HashMap<InstanceId, Value>>,
}

/// POST /comparisons
/// Run a comparison and record it as the new active session
pub async fn create_comparison<S: SessionStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<RunComparisonRequest>,
) -> Result<(StatusCode, Json<ComparisonSession>), ApiError> {
    let comparison_type = match req.type_id.as_deref() {
        Some(type_id) => Some(
            state
                .registry
                .get(type_id)
                .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Comparison type not found"))?,
        ),
        None => None,
    };

    let mode = match (req.mode, comparison_type.as_ref()) {
        (Some(mode), _) => mode,
        (None, Some(comparison_type)) => comparison_type.mode(),
        (None, None) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Either mode or typeId is required",
            ))
        }
    };
    let endpoint = req
        .endpoint
        .or_else(|| comparison_type.map(|t| t.endpoint))
        .unwrap_or_default();

    let payloads = match req.payloads {
        Some(payloads) => payloads,
        None => state.cache.snapshot(&req.instance_ids).await,
    };

    let request = NewComparison {
        name: req.name,
        instance_ids: req.instance_ids,
        mode,
        base_instance_id: req.base_instance_id,
        endpoint,
    };
    let session = SessionAssembler::run(&payloads, request)
        .map_err(|e: CompareError| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;

    let session = state
        .store
        .create_session(session)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}
