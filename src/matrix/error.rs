use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Malformed {event_type} event: {source}")]
    Malformed {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Create event has no sender")]
    MissingSender,

    #[error("Invalid additional_creators entry: {0}")]
    InvalidCreators(String),

    #[error("Invalid power level for '{user}': {value}")]
    InvalidPowerLevel { user: String, value: String },

    #[error("Power levels event has no content object")]
    MissingContent,

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoomVersionError {
    #[error("Unknown room version: {0}")]
    UnknownVersion(String),
}
