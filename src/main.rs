use matrix_v12_proxy::{app, AppState, ProxyConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up BIND_ADDRESS / DOWNSTREAM_URL
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = ProxyConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load config");
        e
    })?;
    info!(downstream = %config.downstream_url, "Proxying power levels");

    let listener = tokio::net::TcpListener::bind(config.bind_address).await.map_err(|e| {
        error!(address = %config.bind_address, error = %e, "Failed to bind");
        e
    })?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app(AppState::from_config(&config)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
