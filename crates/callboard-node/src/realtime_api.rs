//! Real-time pipeline status endpoints.
//!
//! - `/api/realtime/status` - Connection state and delivery counters
//! - `/api/realtime/notifications` - Most recent notifications, newest first
//!
//! ```json
//! {
//!   "state": "connected",
//!   "transport": "simulated",
//!   "attempts": 0,
//!   "subscribers": 4,
//!   "total_emits": 12,
//!   "total_faults": 0,
//!   "invalidations": 22,
//!   "notifications": 9
//! }
//! ```

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use callboard_realtime::ConnectionState;
use serde::{Deserialize, Serialize};

use crate::api::AppState;

/// Notifications returned when no limit is given.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Create the real-time API routes.
pub fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/api/realtime/status", get(get_status))
        .route("/api/realtime/notifications", get(list_notifications))
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: ConnectionState,
    pub transport: &'static str,
    pub attempts: u32,
    pub subscribers: usize,
    pub total_emits: u64,
    pub total_faults: u64,
    pub invalidations: usize,
    pub notifications: usize,
}

/// Query parameters for listing notifications.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<usize>,
}

/// Get the pipeline status.
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let connection = state.binding.connection();
    let stats = state.binding.bus().stats();

    Json(StatusResponse {
        state: connection.current_state(),
        transport: connection.transport_name(),
        attempts: connection.attempts(),
        subscribers: stats.subscribers,
        total_emits: stats.total_emits,
        total_faults: stats.total_faults,
        invalidations: state.invalidations.len(),
        notifications: state.notifications.len(),
    })
}

/// List recent notifications.
async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    Json(state.notifications.recent(limit))
}
