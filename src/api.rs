//! HTTP surface for the shift engine.
//!
//! Role checks live here, at the transport boundary: mutating requests
//! carry the acting user's id, and only the shift's creator may assign,
//! unassign, remove, provider-cancel, or rate, while check-in, check-out,
//! and self-cancel act on the worker named in the request. The engine
//! below assumes authorization already happened.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::analytics::AnalyticsFilter;
use crate::engine::ShiftEngine;
use crate::error::{ErrorKind, Result, RosterError};
use crate::shift::model::{GeoPoint, Shift, ShiftId, ShiftWindow};
use crate::shift::CreateShiftParams;

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<ShiftEngine>,
}

pub fn router(engine: Arc<ShiftEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/shifts", post(create_shift).get(list_shifts))
        .route("/api/shifts/{id}", get(get_shift).delete(remove_shift))
        .route(
            "/api/shifts/{id}/workers",
            post(assign_workers).delete(unassign_workers),
        )
        .route("/api/shifts/{id}/cancel", post(cancel_shift))
        .route("/api/shifts/{id}/check-in", post(check_in))
        .route("/api/shifts/{id}/check-out", post(check_out))
        .route("/api/shifts/{id}/rating", post(add_rating))
        .route("/api/providers/{id}/analytics", get(provider_analytics))
        .route("/api/providers/{id}/analytics/export", get(export_analytics))
        .layer(cors)
        .with_state(ApiState { engine })
}

/// Serve the API until the token is cancelled.
pub async fn serve(
    addr: SocketAddr,
    engine: Arc<ShiftEngine>,
    token: CancellationToken,
) -> Result<()> {
    let app = router(engine);
    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RosterError::Internal(format!("failed to bind {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .map_err(|e| RosterError::Internal(format!("API server failed: {e}")))
}

struct ApiError(RosterError);

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateShiftRequest {
    job_id: Uuid,
    application_id: Uuid,
    worker_id: Uuid,
    creator_id: Uuid,
    #[serde(flatten)]
    window: ShiftWindow,
    location: Option<String>,
    notes: Option<String>,
    break_minutes: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListShiftsQuery {
    provider: Option<Uuid>,
    worker: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorQuery {
    actor_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkerSetRequest {
    actor_id: Uuid,
    worker_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelShiftRequest {
    actor_id: Uuid,
    /// Present for a worker cancelling their own assignment; absent for a
    /// provider cancelling the whole shift.
    worker_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttendanceRequest {
    worker_id: Uuid,
    geo: Option<GeoPoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingRequest {
    worker_id: Uuid,
    rater_id: Uuid,
    rating: u8,
    feedback: Option<String>,
}

async fn require_creator(engine: &ShiftEngine, shift_id: ShiftId, actor: Uuid) -> Result<Shift> {
    let shift = engine.lifecycle().shift(shift_id).await?;
    if shift.created_by != actor {
        return Err(RosterError::NotShiftCreator(shift_id));
    }
    Ok(shift)
}

async fn create_shift(
    State(state): State<ApiState>,
    Json(req): Json<CreateShiftRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let shift = state
        .engine
        .lifecycle()
        .create_shift(CreateShiftParams {
            job_id: req.job_id,
            application_id: req.application_id,
            worker_id: req.worker_id,
            creator: req.creator_id,
            window: req.window,
            location: req.location,
            notes: req.notes,
            break_minutes: req.break_minutes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

async fn list_shifts(
    State(state): State<ApiState>,
    Query(query): Query<ListShiftsQuery>,
) -> Json<Vec<Shift>> {
    let lifecycle = state.engine.lifecycle();
    let shifts = match (query.provider, query.worker) {
        (Some(provider), _) => lifecycle.shifts_for_provider(provider).await,
        (None, Some(worker)) => lifecycle.shifts_for_worker(worker).await,
        (None, None) => lifecycle.shifts().await,
    };
    Json(shifts)
}

async fn get_shift(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
) -> std::result::Result<Json<Shift>, ApiError> {
    Ok(Json(state.engine.lifecycle().shift(shift_id).await?))
}

async fn remove_shift(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Query(query): Query<ActorQuery>,
) -> std::result::Result<StatusCode, ApiError> {
    require_creator(&state.engine, shift_id, query.actor_id).await?;
    state.engine.lifecycle().remove_shift(shift_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn assign_workers(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<WorkerSetRequest>,
) -> std::result::Result<Json<Shift>, ApiError> {
    require_creator(&state.engine, shift_id, req.actor_id).await?;
    let shift = state
        .engine
        .lifecycle()
        .assign_workers(shift_id, req.actor_id, &req.worker_ids)
        .await?;
    Ok(Json(shift))
}

async fn unassign_workers(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<WorkerSetRequest>,
) -> std::result::Result<Json<Shift>, ApiError> {
    require_creator(&state.engine, shift_id, req.actor_id).await?;
    let shift = state
        .engine
        .lifecycle()
        .unassign_workers(shift_id, &req.worker_ids)
        .await?;
    Ok(Json(shift))
}

async fn cancel_shift(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<CancelShiftRequest>,
) -> std::result::Result<Json<Shift>, ApiError> {
    let shift = match req.worker_id {
        Some(worker_id) => {
            if req.actor_id != worker_id {
                return Err(RosterError::NotActingWorker { shift_id, worker_id }.into());
            }
            state
                .engine
                .lifecycle()
                .cancel_by_worker(shift_id, worker_id)
                .await?
        }
        None => {
            require_creator(&state.engine, shift_id, req.actor_id).await?;
            state.engine.lifecycle().cancel_shift(shift_id).await?
        }
    };
    Ok(Json(shift))
}

async fn check_in(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<AttendanceRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let row = state
        .engine
        .attendance()
        .check_in(shift_id, req.worker_id, req.geo)
        .await?;
    Ok(Json(row))
}

async fn check_out(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<AttendanceRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let row = state
        .engine
        .attendance()
        .check_out(shift_id, req.worker_id, req.geo)
        .await?;
    Ok(Json(row))
}

async fn add_rating(
    State(state): State<ApiState>,
    Path(shift_id): Path<ShiftId>,
    Json(req): Json<RatingRequest>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let row = state
        .engine
        .attendance()
        .add_rating(shift_id, req.worker_id, req.rater_id, req.rating, req.feedback)
        .await?;
    Ok(Json(row))
}

async fn provider_analytics(
    State(state): State<ApiState>,
    Path(provider): Path<Uuid>,
    Query(filter): Query<AnalyticsFilter>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let summary = state
        .engine
        .analytics()
        .provider_shift_analytics(provider, &filter)
        .await?;
    Ok(Json(summary))
}

async fn export_analytics(
    State(state): State<ApiState>,
    Path(provider): Path<Uuid>,
    Query(filter): Query<AnalyticsFilter>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let csv = state
        .engine
        .analytics()
        .export_csv(provider, &filter)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}
