//! Server startup and lifecycle

use crate::{config::Config, routes, routes::AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the proxy server until the process is terminated
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = AppState::from_config(config);
    log_mode(&state);

    let app = routes::create_router(state);
    let listener = TcpListener::bind(&addr).await?;

    info!("pdfshelf listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run the server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: Config,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = AppState::from_config(config);
    log_mode(&state);

    let app = routes::create_router(state);
    let listener = TcpListener::bind(&addr).await?;

    info!("pdfshelf listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("shutdown complete");
    Ok(())
}

fn log_mode(state: &AppState) {
    match state.config.repo_slug() {
        Some(slug) => info!(
            repo = %slug,
            branch = %state.config.branch,
            base_path = %state.config.base_path,
            "serving repository"
        ),
        None => warn!("no owner/repo configured; repository endpoints will return BadConfig"),
    }
    if !state.config.writable() {
        warn!("no GH_TOKEN configured; uploads are disabled (read-only mode)");
    }
}
