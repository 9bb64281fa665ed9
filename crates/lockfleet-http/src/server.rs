use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use lockfleet_domain::{FleetService, SnapshotStore};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct ApiState {
    pub fleet: Arc<FleetService>,
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Process start time for uptime reporting
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(fleet: Arc<FleetService>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            fleet,
            snapshots,
            start_time: Instant::now(),
        }
    }
}

/// Build the API router:
/// - GET  /health
/// - GET  /api/locks
/// - GET  /api/locks/{id}
/// - POST /api/locks/{id}/unlock
/// - GET  /api/activity
/// - GET  /api/state
/// - POST /api/snapshot
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/locks", get(handlers::list_locks))
        .route("/api/locks/{id}", get(handlers::get_lock))
        .route("/api/locks/{id}/unlock", post(handlers::post_unlock))
        .route("/api/activity", get(handlers::get_activity))
        .route("/api/state", get(handlers::get_state))
        .route("/api/snapshot", post(handlers::post_snapshot))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the API until the token is cancelled.
pub async fn start_server(
    addr: &str,
    state: ApiState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
