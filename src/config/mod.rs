use std::env;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;
use url::Url;

/// Prefix checked before the bare variable name, e.g. `V12_BIND_ADDRESS` then `BIND_ADDRESS`.
pub const ENV_PREFIX: &str = "V12";

pub const DEFAULT_BIND_ADDRESS: &str = ":8080";
pub const DEFAULT_DOWNSTREAM_URL: &str = "http://localhost:8008";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {reason}")]
    InvalidBindAddress { value: String, reason: String },

    #[error("invalid downstream url '{value}': {reason}")]
    InvalidDownstreamUrl { value: String, reason: String },
}

/// Process configuration. Built once at startup and handed to the router state;
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub bind_address: SocketAddr,
    pub downstream_url: Url,
}

impl ProxyConfig {
    pub fn new(bind_address: &str, downstream_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: parse_bind_address(bind_address)?,
            downstream_url: parse_downstream_url(downstream_url)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. `from_env` delegates here so the
    /// precedence rules can be tested without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str, default: &str| {
            lookup(&format!("{}_{}", ENV_PREFIX, name))
                .or_else(|| lookup(name))
                .unwrap_or_else(|| default.to_string())
        };

        Self::new(
            &read("BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            &read("DOWNSTREAM_URL", DEFAULT_DOWNSTREAM_URL),
        )
    }
}

/// Accepts `host:port` as well as the host-less `:port` form, which binds every
/// interface.
fn parse_bind_address(value: &str) -> Result<SocketAddr, ConfigError> {
    let trimmed = value.trim();
    let candidate = match trimmed.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => trimmed.to_string(),
    };

    let invalid = |reason: String| ConfigError::InvalidBindAddress {
        value: value.to_string(),
        reason,
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Fall back to name resolution for forms like `localhost:8080`.
    candidate
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("name did not resolve to any address".to_string()))
}

fn parse_downstream_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidDownstreamUrl {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(value.trim()).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot carry a path"));
    }

    Ok(url)
}
