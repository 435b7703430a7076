//! Client for the room server the proxy sits in front of.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Downstream url cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    #[error("unexpected status code {0}")]
    UnexpectedStatus(StatusCode),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Read access to a room's current state.
#[async_trait]
pub trait StateEventSource: Send + Sync {
    /// Fetch the full event (not just `content`) for `event_type` with an empty
    /// state key. The caller's `Authorization` header is forwarded as given.
    async fn fetch_state_event(
        &self,
        authorization: Option<&HeaderValue>,
        room_id: &str,
        event_type: &str,
    ) -> Result<Bytes, UpstreamError>;
}

/// [`StateEventSource`] backed by the client-server API of the downstream server.
///
/// Issues exactly one request per call with no retries. Dropping the returned
/// future aborts the request.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// `{base}/_matrix/client/v3/rooms/{roomId}/state/{eventType}/?format=event`
    pub fn state_event_url(&self, room_id: &str, event_type: &str) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["_matrix", "client", "v3", "rooms", room_id, "state", event_type, ""]);
        url.set_query(Some("format=event"));
        url.set_fragment(None);
        Ok(url)
    }
}

#[async_trait]
impl StateEventSource for UpstreamClient {
    async fn fetch_state_event(
        &self,
        authorization: Option<&HeaderValue>,
        room_id: &str,
        event_type: &str,
    ) -> Result<Bytes, UpstreamError> {
        let url = self.state_event_url(room_id, event_type)?;
        tracing::info!("<-- GET {}", url.path());

        let mut request = self.http.get(url);
        if let Some(auth) = authorization {
            request = request.header(header::AUTHORIZATION, auth.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::UnexpectedStatus(status));
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new(Url::parse(base).unwrap())
    }

    #[test]
    fn test_state_event_url() {
        let url = client("http://localhost:8008")
            .state_event_url("!room:example.org", "m.room.create")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8008/_matrix/client/v3/rooms/!room:example.org/state/m.room.create/?format=event"
        );
    }

    #[test]
    fn test_state_event_url_keeps_base_path() {
        let url = client("https://matrix.example.org/proxied/")
            .state_event_url("!room:example.org", "m.room.power_levels")
            .unwrap();
        assert_eq!(
            url.path(),
            "/proxied/_matrix/client/v3/rooms/!room:example.org/state/m.room.power_levels/"
        );
    }

    #[test]
    fn test_state_event_url_escapes_segments() {
        let url = client("http://localhost:8008")
            .state_event_url("!a/b?c#d:x", "m.room.create")
            .unwrap();
        assert_eq!(
            url.path(),
            "/_matrix/client/v3/rooms/!a%2Fb%3Fc%23d:x/state/m.room.create/"
        );
        assert_eq!(url.query(), Some("format=event"));
    }

    #[test]
    fn test_state_event_url_drops_base_query() {
        let url = client("http://localhost:8008/?debug=1")
            .state_event_url("!room:x", "m.room.create")
            .unwrap();
        assert_eq!(url.query(), Some("format=event"));
    }
}
