//! otpgate Server - second-factor check for MFA gateways
//!
//! Exposes otpgate-core over HTTP:
//! - POST /mfa/validate - Check the Yubikey OTP of an authenticated user
//! - GET /health - Health check

use std::net::SocketAddr;

use anyhow::Context;
use otpgate_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("otpgate_server=info,otpgate_core=info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();

    let document = std::fs::read(&config.config_path).with_context(|| {
        format!(
            "Failed to read configuration document {}",
            config.config_path.display()
        )
    })?;
    let state = AppState::from_config(&document).context("Invalid MFA configuration")?;

    tracing::info!(
        providers = ?state.registry.provider_ids(),
        users = state.bindings.len(),
        config = %config.config_path.display(),
        "Configuration loaded"
    );
    if state.registry.is_empty() {
        tracing::warn!("No MFA provider configured, users with bindings will be refused");
    }

    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
