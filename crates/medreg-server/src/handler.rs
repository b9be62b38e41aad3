use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use medreg_registry::{AdmissionKind, Invitation, Registry};
use medreg_types::RecordId;

use crate::error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

/// Body of `POST /v1/records`.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub invitation: Invitation,
    pub record: Value,
}

/// Body returned for an accepted submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: &'static str,
    pub record_id: RecordId,
    pub kind: AdmissionKind,
    pub admitted_count: u64,
    pub seat_exited: bool,
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let registry = state.registry();
    Json(json!({
        "name": "medreg-server",
        "version": env!("CARGO_PKG_VERSION"),
        "namespace": registry.config().namespace,
        "capacity": registry.capacity(),
        "admittedCount": registry.admitted_count().await,
    }))
}

pub async fn invitation_handler(State(state): State<AppState>) -> (StatusCode, Json<Invitation>) {
    (StatusCode::CREATED, Json(state.registry().make_invitation()))
}

pub async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let offer = state
        .registry()
        .offer(request.invitation, &request.record)
        .await?;
    let seat_exited = offer.seat.has_exited();
    let admission = offer.result?;
    Ok(Json(SubmitResponse {
        message: admission.message(),
        record_id: admission.record_id,
        kind: admission.kind,
        admitted_count: admission.admitted_count,
        seat_exited,
    }))
}

/// Lists stored identities in the storage-node `children` shape.
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let ids = state.registry().reader().list_ids().await?;
    Ok(Json(json!({ "children": ids })))
}

pub async fn show_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.registry().reader().fetch(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(id)),
    }
}
