use std::collections::BTreeMap;

use axum::body::Bytes;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

use super::error::EventError;

pub const ROOM_CREATE: &str = "m.room.create";
pub const ROOM_POWER_LEVELS: &str = "m.room.power_levels";

/// Largest integer exactly representable in an IEEE-754 double (2^53 - 1).
pub const MAX_POWER_LEVEL: i64 = (1 << 53) - 1;

#[derive(Debug, Deserialize)]
struct RawCreateEvent {
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    content: Option<Value>,
}

/// The fields of an `m.room.create` event that matter for power levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationEvent {
    pub sender: String,
    /// `None` when the field is absent, empty or not a string.
    pub room_version: Option<String>,
    /// Left unvalidated; the field only has meaning in rooms with privileged
    /// creators and is checked by [`CreationEvent::creators`].
    pub additional_creators: Option<Value>,
}

impl CreationEvent {
    pub fn parse(raw: &[u8]) -> Result<Self, EventError> {
        let event: RawCreateEvent = serde_json::from_slice(raw).map_err(|source| EventError::Malformed {
            event_type: ROOM_CREATE,
            source,
        })?;

        let sender = match event.sender {
            Some(sender) if !sender.is_empty() => sender,
            _ => return Err(EventError::MissingSender),
        };

        let mut content = match event.content {
            Some(Value::Object(content)) => content,
            _ => Map::new(),
        };

        let room_version = match content.remove("room_version") {
            Some(Value::String(v)) if !v.is_empty() => Some(v),
            None | Some(Value::Null) => None,
            Some(other) => {
                tracing::warn!(
                    "Create event from '{}' has unusable room_version {}; treating as unversioned",
                    sender,
                    other
                );
                None
            }
        };

        Ok(Self {
            sender,
            room_version,
            additional_creators: content.remove("additional_creators"),
        })
    }

    /// The sender followed by every additional creator.
    pub fn creators(&self) -> Result<Vec<&str>, EventError> {
        let mut creators = vec![self.sender.as_str()];
        match &self.additional_creators {
            None | Some(Value::Null) => {}
            Some(Value::Array(additional)) => {
                for creator in additional {
                    match creator {
                        Value::String(creator) => creators.push(creator.as_str()),
                        other => return Err(EventError::InvalidCreators(other.to_string())),
                    }
                }
            }
            Some(other) => return Err(EventError::InvalidCreators(other.to_string())),
        }
        Ok(creators)
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    content: Option<Box<RawValue>>,
}

/// An `m.room.power_levels` event as fetched from upstream.
///
/// Nothing is parsed up front, so an event that is passed through untouched is
/// returned exactly as received whatever its shape.
#[derive(Debug, Clone)]
pub struct PowerLevelsEvent {
    raw: Bytes,
}

impl PowerLevelsEvent {
    pub fn new(raw: Bytes) -> Self {
        Self { raw }
    }

    /// The event exactly as fetched
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The `content` value exactly as fetched
    pub fn raw_content(&self) -> Result<Box<RawValue>, EventError> {
        let envelope: RawEnvelope = serde_json::from_slice(&self.raw).map_err(malformed_power_levels)?;
        envelope.content.ok_or(EventError::MissingContent)
    }

    /// The whole event parsed, with `content` guaranteed to be an object.
    pub fn document(&self) -> Result<Map<String, Value>, EventError> {
        let document: Map<String, Value> = serde_json::from_slice(&self.raw).map_err(malformed_power_levels)?;
        if !matches!(document.get("content"), Some(Value::Object(_))) {
            return Err(EventError::MissingContent);
        }
        Ok(document)
    }
}

fn malformed_power_levels(source: serde_json::Error) -> EventError {
    EventError::Malformed {
        event_type: ROOM_POWER_LEVELS,
        source,
    }
}

/// `content.users` of a power levels document, empty when absent or null.
///
/// Older room versions allowed power levels as numeric strings, so those are
/// accepted alongside integers; floats are truncated.
pub fn users_of(document: &Map<String, Value>) -> Result<BTreeMap<String, i64>, EventError> {
    let users = match document.get("content").and_then(|c| c.get("users")) {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(users)) => users,
        Some(other) => {
            return Err(EventError::InvalidPowerLevel {
                user: "users".to_string(),
                value: other.to_string(),
            })
        }
    };

    users
        .iter()
        .map(|(user, value)| {
            power_level_from_value(value)
                .map(|level| (user.clone(), level))
                .ok_or_else(|| EventError::InvalidPowerLevel {
                    user: user.clone(),
                    value: value.to_string(),
                })
        })
        .collect()
}

fn power_level_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
