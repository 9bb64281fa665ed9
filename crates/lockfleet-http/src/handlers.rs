use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use lockfleet_domain::{ActivityEntry, ActivityKind, DomainError, LockRecord};
use serde::Serialize;
use tracing::error;

use crate::server::ApiState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for GET /api/locks.
#[derive(Debug, Serialize)]
pub struct LockListResponse {
    pub locks: Vec<LockRecord>,
}

/// Response body for GET /api/activity.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Vec<ActivityDto>,
}

/// One activity entry with the payload hex-encoded for display.
#[derive(Debug, Serialize)]
pub struct ActivityDto {
    pub at: DateTime<Utc>,
    pub device_id: String,
    pub kind: ActivityKind,
    pub payload: String,
}

impl From<ActivityEntry> for ActivityDto {
    fn from(entry: ActivityEntry) -> Self {
        Self {
            at: entry.at,
            device_id: entry.device_id,
            kind: entry.kind,
            payload: hex::encode(entry.payload),
        }
    }
}

/// Response body for POST /api/locks/{id}/unlock.
#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub device_id: String,
    pub pending: usize,
}

/// Response body for POST /api/snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub status: String,
    pub locks: usize,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/locks
pub async fn list_locks(State(state): State<ApiState>) -> Json<LockListResponse> {
    Json(LockListResponse {
        locks: state.fleet.locks().await,
    })
}

/// GET /api/locks/{id}
pub async fn get_lock(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.fleet.lock(&id).await {
        Some(record) => Json(record).into_response(),
        None => not_found(&id),
    }
}

/// POST /api/locks/{id}/unlock
///
/// Queues the unlock command; delivery happens in the device's next
/// receive window, so the request is only ever accepted, not fulfilled.
pub async fn post_unlock(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.fleet.enqueue_unlock(&id).await {
        Ok(()) => {
            let pending = state.fleet.pending_commands(&id).await;
            (
                StatusCode::ACCEPTED,
                Json(UnlockResponse {
                    device_id: id,
                    pending,
                }),
            )
                .into_response()
        }
        Err(DomainError::LockNotFound(_)) => not_found(&id),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /api/activity
pub async fn get_activity(State(state): State<ApiState>) -> Json<ActivityResponse> {
    let activity = state
        .fleet
        .recent_activity()
        .await
        .into_iter()
        .map(ActivityDto::from)
        .collect();
    Json(ActivityResponse { activity })
}

/// GET /api/state
///
/// The snapshot document as currently held in memory.
pub async fn get_state(State(state): State<ApiState>) -> Json<Vec<LockRecord>> {
    Json(state.fleet.locks().await)
}

/// POST /api/snapshot
///
/// Trigger a best-effort snapshot write. Failures are logged, never
/// surfaced to the caller.
pub async fn post_snapshot(State(state): State<ApiState>) -> Response {
    let records = state.fleet.locks().await;
    if let Err(e) = state.snapshots.save(&records).await {
        error!(error = %e, "snapshot save failed");
    }
    (
        StatusCode::ACCEPTED,
        Json(SnapshotResponse {
            status: "accepted".to_string(),
            locks: records.len(),
        }),
    )
        .into_response()
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Lock not found: {}", id),
        }),
    )
        .into_response()
}
