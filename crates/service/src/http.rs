//! HTTP surface of the OTA daemon
//!
//! Thin axum handlers over the delivery crate: extractors validate the
//! wire shapes, the services own the semantics, and `ApiError` maps
//! delivery errors onto status codes. Not-found conditions become 404
//! with a reason string; persistence failures become 500 while the
//! server stays up.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use fleet_ota_schemas::{
    AssignRequest, AssignResponse, BuildId, CompileRequest, CompileResponse, DeviceId,
    EventLogged, EventReport, PollResponse,
};
use openfleet_delivery::{
    AssignmentLedger, CompileOutcome, DeliveryError, DeliveryService, EventLog, FirmwareCompiler,
    FirmwareRegistry,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub registry: FirmwareRegistry,
    pub assignments: AssignmentLedger,
    pub events: EventLog,
    pub delivery: DeliveryService,
    pub compiler: Arc<dyn FirmwareCompiler>,
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ota/assign", post(assign))
        .route("/ota/check", get(check))
        .route("/ota/push/{device_id}", get(push))
        .route("/ota/events", post(report_event).get(list_events))
        .route("/firmware/download/{build_id}", get(download))
        .route("/firmware/compile", post(compile))
        .with_state(state)
}

/// Handler-level error mapped onto a status code
#[derive(Debug)]
pub struct ApiError(DeliveryError);

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(serde_json::json!({ "detail": self.0.to_string() }));
        (status, body).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "running" }))
}

async fn assign(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<AssignResponse>, ApiError> {
    state
        .assignments
        .assign(req.device_id.clone(), req.build_id.clone())
        .await?;
    Ok(Json(AssignResponse::assigned(req.device_id, req.build_id)))
}

#[derive(Debug, Deserialize)]
struct CheckParams {
    device_id: DeviceId,
}

async fn check(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> Json<PollResponse> {
    match state.assignments.poll(&params.device_id).await {
        Some(build_id) => Json(PollResponse::pending(build_id)),
        None => Json(PollResponse::no_update()),
    }
}

async fn download(
    State(state): State<AppState>,
    Path(build_id): Path<BuildId>,
) -> Result<Response, ApiError> {
    let artifact = state.delivery.pull_download(&build_id).await?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, artifact.len().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn push(
    State(state): State<AppState>,
    Path(device_id): Path<DeviceId>,
) -> Result<Response, ApiError> {
    let delivery = state.delivery.push_stream(&device_id).await?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, delivery.content_length)
        .header("x-firmware-build", delivery.build_id.as_ref())
        .body(Body::from_stream(delivery.stream))
        .map_err(|e| DeliveryError::Io(std::io::Error::other(e)))?;
    Ok(response)
}

async fn report_event(
    State(state): State<AppState>,
    Json(report): Json<EventReport>,
) -> Json<EventLogged> {
    state
        .events
        .append(report.device_id, report.build_id, report.status, report.reason)
        .await;
    Json(EventLogged::logged())
}

async fn list_events(State(state): State<AppState>) -> Json<serde_json::Value> {
    let events = state.events.recent().await;
    Json(serde_json::json!({ "events": events }))
}

async fn compile(
    State(state): State<AppState>,
    Json(req): Json<CompileRequest>,
) -> Result<Json<CompileResponse>, ApiError> {
    let outcome = state
        .registry
        .register_compiled(state.compiler.as_ref(), &req.code)
        .await
        .map_err(|e| DeliveryError::Io(std::io::Error::other(e)))?;

    let response = match outcome {
        CompileOutcome::Success { build_id, logs, .. } => CompileResponse {
            success: true,
            build_id: Some(build_id),
            logs,
        },
        CompileOutcome::Failure { logs } => CompileResponse {
            success: false,
            build_id: None,
            logs,
        },
    };
    Ok(Json(response))
}
