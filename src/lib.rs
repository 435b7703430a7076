pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod matrix;
pub mod upstream;

pub use app::{app, AppState};
pub use config::ProxyConfig;
