//! HTTP server initialization and runtime setup.

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::Config;
use crate::forum;
use crate::routing::Router;
use crate::transport::app_router;

/// Builds the forum dispatch table from configuration.
///
/// # Errors
///
/// Returns an error if the models or routes fail to build.
pub fn build_router(config: &Config) -> Result<Arc<Router>> {
    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_seconds);
    let hasher = PasswordHasher::new(config.password_pepper.clone());

    Ok(Arc::new(forum::dispatcher(tokens, hasher)?))
}

/// Runs the HTTP server with the given configuration until Ctrl-C.
///
/// # Errors
///
/// Returns an error if:
/// - The dispatch table fails to build
/// - The listen address is invalid or the bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let router = build_router(&config)?;
    let app = app_router(router);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
