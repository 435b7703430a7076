// handlers/mod.rs - HTTP handlers
//
// The proxy serves exactly one read path. Everything else is rejected by the
// router fallback in `app`.

pub mod power_levels;

pub use power_levels::{get_power_levels, ProxyError};
