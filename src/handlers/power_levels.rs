use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::{render, OutputShape};
use crate::app::AppState;
use crate::error::ApiError;
use crate::matrix::{
    room_version::declared_version, synthesize, CreationEvent, EventError, PowerLevelsEvent, RoomVersionError,
    Stability, ROOM_CREATE, ROOM_POWER_LEVELS,
};
use crate::upstream::UpstreamError;

/// Failures while serving one power levels request. Each variant is logged in
/// full and reaches the caller only as a fixed `M_UNKNOWN` message.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("fetching create event: {0}")]
    FetchCreateEvent(#[source] UpstreamError),

    #[error("fetching power levels event: {0}")]
    FetchPowerLevels(#[source] UpstreamError),

    #[error("parsing create event: {0}")]
    CreateEvent(#[source] EventError),

    #[error("parsing power levels event: {0}")]
    PowerLevelsEvent(#[source] EventError),

    #[error("resolving room version: {0}")]
    RoomVersion(#[from] RoomVersionError),

    #[error("synthesizing power levels: {0}")]
    Synthesis(#[source] EventError),
}

impl ProxyError {
    /// Client-safe message
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::FetchCreateEvent(_) | ProxyError::CreateEvent(_) => "Failed to get room create event",
            ProxyError::FetchPowerLevels(_) | ProxyError::PowerLevelsEvent(_) => {
                "Failed to get room power levels event"
            }
            ProxyError::RoomVersion(_) => "Failed to get room version",
            ProxyError::Synthesis(_) => "Failed to set users",
        }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError::unknown(err.public_message())
    }
}

/// GET /_matrix/client/:version/rooms/:room_id/m.room.power_levels[/]
///
/// Mounted for every method so non-GET requests get a Matrix-shaped 405.
pub async fn get_power_levels(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Response {
    tracing::info!("--> {} {}", method, uri.path());

    if method != Method::GET {
        return ApiError::method_not_allowed().into_response();
    }

    let room_id = match path {
        Ok(Path((_endpoint_version, room_id))) => room_id,
        Err(e) => {
            tracing::warn!("Rejecting {} {}: {}", method, uri.path(), e);
            return ApiError::unrecognized_route().into_response();
        }
    };

    let shape = OutputShape::from_query(query.as_deref());
    match power_levels_for_room(&state, headers.get(header::AUTHORIZATION), &room_id, shape).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("{} {} failed: {}", method, uri.path(), e);
            ApiError::from(e).into_response()
        }
    }
}

async fn power_levels_for_room(
    state: &AppState,
    authorization: Option<&HeaderValue>,
    room_id: &str,
    shape: OutputShape,
) -> Result<axum::body::Bytes, ProxyError> {
    let upstream = state.upstream.as_ref();

    // Independent reads; the first failure drops the other request.
    let (create_raw, power_levels_raw) = tokio::try_join!(
        async {
            upstream
                .fetch_state_event(authorization, room_id, ROOM_CREATE)
                .await
                .map_err(ProxyError::FetchCreateEvent)
        },
        async {
            upstream
                .fetch_state_event(authorization, room_id, ROOM_POWER_LEVELS)
                .await
                .map_err(ProxyError::FetchPowerLevels)
        },
    )?;

    let create = CreationEvent::parse(&create_raw).map_err(ProxyError::CreateEvent)?;
    let version = state.room_versions.resolve(&create)?;
    tracing::info!("Room '{}' is ~version '{}'", room_id, declared_version(&create));
    if version.stability == Stability::Unstable {
        tracing::warn!("Room '{}' uses unstable room version '{}'", room_id, version.id);
    }

    let power_levels = PowerLevelsEvent::new(power_levels_raw);
    let synthesized = synthesize(&create, power_levels, version.privileged_creators).map_err(|e| match e {
        EventError::Malformed { .. } | EventError::MissingContent => ProxyError::PowerLevelsEvent(e),
        e => ProxyError::Synthesis(e),
    })?;

    render(&synthesized, shape).map_err(|e| {
        if synthesized.is_rewritten() {
            ProxyError::Synthesis(e)
        } else {
            ProxyError::PowerLevelsEvent(e)
        }
    })
}
