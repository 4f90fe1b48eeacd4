use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::ServerState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Server info response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerInfoResponse {
    pub version: String,
    pub features: ServerFeatures,
    pub uptime_seconds: u64,
}

/// Feature flags surfaced to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerFeatures {
    pub geocoding: bool,
    pub export_formats: Vec<String>,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<ServerState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    (StatusCode::OK, Json(response))
}

/// Server info endpoint
pub async fn server_info(
    State(state): State<Arc<ServerState>>,
) -> (StatusCode, Json<ServerInfoResponse>) {
    let response = ServerInfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: ServerFeatures {
            geocoding: state.geocoder.is_enabled(),
            export_formats: vec!["csv".to_string(), "json".to_string(), "html".to_string()],
        },
        uptime_seconds: state.uptime_seconds(),
    };

    (StatusCode::OK, Json(response))
}
