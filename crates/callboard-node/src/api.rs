//! HTTP API for the Callboard node.

use axum::{response::IntoResponse, routing::get, Json, Router};
use callboard_realtime::{InvalidationLog, NotificationLog, RealtimeBinding, RealtimeError};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::NodeConfig;
use crate::realtime_api::realtime_routes;
use crate::sinks::{LoggedCache, LoggedNotifier};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The real-time pipeline.
    pub binding: Arc<RealtimeBinding>,
    /// Invalidation requests issued by the binding.
    pub invalidations: Arc<InvalidationLog>,
    /// Notifications raised by the pipeline.
    pub notifications: Arc<NotificationLog>,
}

impl AppState {
    /// Build the pipeline described by `config`. The binding starts inactive.
    pub fn from_config(config: &NodeConfig) -> Result<Self, RealtimeError> {
        let invalidations = Arc::new(InvalidationLog::new());
        let notifications = Arc::new(NotificationLog::new());
        let binding = config.realtime().build(
            Arc::new(LoggedCache::new(invalidations.clone())),
            Arc::new(LoggedNotifier::new(notifications.clone())),
        )?;

        Ok(Self {
            binding: Arc::new(binding),
            invalidations,
            notifications,
        })
    }
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(realtime_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
