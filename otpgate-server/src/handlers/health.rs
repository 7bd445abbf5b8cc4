//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded"
    pub status: &'static str,
    /// Server version from Cargo.toml
    pub version: &'static str,
    /// Configured MFA providers, in evaluation order
    pub providers: Vec<&'static str>,
    /// Service name
    pub service: &'static str,
}

/// GET /health - Health check endpoint
///
/// Reports "degraded" when no MFA provider is configured, since every user
/// with bindings would then be refused.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.registry.provider_ids();

    let status = if providers.is_empty() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        providers,
        service: "otpgate-server",
    })
}
