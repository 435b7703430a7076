use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use matrix_v12_proxy::{app, AppState, ProxyConfig};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A request as seen by the fake room server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
struct RoomServerState {
    // (room id, event type) -> raw event body
    events: Arc<HashMap<(String, String), String>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Fixtures served by the fake room server
#[derive(Default)]
pub struct Rooms {
    events: HashMap<(String, String), String>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, room_id: &str, event_type: &str, event: Value) -> Self {
        self.events
            .insert((room_id.to_string(), event_type.to_string()), event.to_string());
        self
    }

    /// Serve `raw` exactly, byte for byte
    pub fn raw_event(mut self, room_id: &str, event_type: &str, raw: &str) -> Self {
        self.events
            .insert((room_id.to_string(), event_type.to_string()), raw.to_string());
        self
    }

    /// A room with a create event of the given version and a simple power levels event
    pub fn room(self, room_id: &str, room_version: Option<&str>) -> Self {
        let mut content = json!({});
        if let Some(v) = room_version {
            content["room_version"] = json!(v);
        }

        self.event(
            room_id,
            "m.room.create",
            json!({"type": "m.room.create", "sender": "@alice:x", "state_key": "", "content": content}),
        )
        .event(
            room_id,
            "m.room.power_levels",
            json!({
                "type": "m.room.power_levels",
                "sender": "@alice:x",
                "state_key": "",
                "content": {"users": {"@carol:x": 50}, "ban": 50}
            }),
        )
    }
}

pub struct TestEnv {
    pub base_url: String,
    room_server: RoomServerState,
}

impl TestEnv {
    /// Start a fake room server with `rooms` and a proxy pointed at it.
    pub async fn start(rooms: Rooms) -> Result<Self> {
        let room_server = RoomServerState {
            events: Arc::new(rooms.events),
            requests: Arc::default(),
        };

        let downstream_port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let downstream = TcpListener::bind(("127.0.0.1", downstream_port))
            .await
            .context("failed to bind fake room server")?;
        let router = Router::new()
            .route(
                "/_matrix/client/v3/rooms/:room_id/state/:event_type/",
                get(serve_state_event),
            )
            .with_state(room_server.clone());
        tokio::spawn(async move {
            let _ = axum::serve(downstream, router).await;
        });

        let proxy_port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let config = ProxyConfig::new(
            &format!("127.0.0.1:{}", proxy_port),
            &format!("http://127.0.0.1:{}", downstream_port),
        )?;
        let proxy = TcpListener::bind(config.bind_address)
            .await
            .context("failed to bind proxy")?;
        let router = app(AppState::from_config(&config));
        tokio::spawn(async move {
            let _ = axum::serve(proxy, router).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", proxy_port),
            room_server,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.room_server.requests.lock().unwrap().clone()
    }
}

async fn serve_state_event(
    State(state): State<RoomServerState>,
    Path((room_id, event_type)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    match state.events.get(&(room_id, event_type)) {
        Some(raw) => (StatusCode::OK, raw.clone()),
        None => (
            StatusCode::NOT_FOUND,
            json!({"errcode": "M_NOT_FOUND", "error": "Event not found"}).to_string(),
        ),
    }
}
