//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::db::SharedStore;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// GET /health - Probe the document store and report server health
pub async fn check(State(store): State<SharedStore>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION"),
                reason: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    version: env!("CARGO_PKG_VERSION"),
                    reason: Some("Document store unavailable".to_string()),
                }),
            )
        }
    }
}
