use std::sync::Arc;

use axum::{
    http::{Method, Uri},
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::matrix::RoomVersionRegistry;
use crate::upstream::{StateEventSource, UpstreamClient};

/// Shared, read-only per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn StateEventSource>,
    pub room_versions: Arc<RoomVersionRegistry>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn StateEventSource>, room_versions: RoomVersionRegistry) -> Self {
        Self {
            upstream,
            room_versions: Arc::new(room_versions),
        }
    }

    /// Production state: the downstream client-server API and the standard room versions.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            Arc::new(UpstreamClient::new(config.downstream_url.clone())),
            RoomVersionRegistry::standard(),
        )
    }
}

pub fn app(state: AppState) -> Router {
    use handlers::get_power_levels;

    Router::new()
        .route(
            "/_matrix/client/:version/rooms/:room_id/m.room.power_levels",
            any(get_power_levels),
        )
        .route(
            "/_matrix/client/:version/rooms/:room_id/m.room.power_levels/",
            any(get_power_levels),
        )
        .fallback(reject)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn reject(method: Method, uri: Uri) -> ApiError {
    tracing::info!("REJECT {} {}", method, uri.path());
    ApiError::unrecognized_route()
}
