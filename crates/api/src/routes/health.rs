//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::{AppState, Backend};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub timestamp: String,
    pub database: &'static str,
}

/// GET /health: returns service health, pinging the database when one is
/// configured.
pub async fn check<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match &state.database {
        None => (StatusCode::OK, "ok", "in-memory"),
        Some(store) => match store.health().await {
            Ok(()) => (StatusCode::OK, "ok", "ok"),
            Err(err) => {
                tracing::warn!(error = %err, "health check failed");
                (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
            }
        },
    };

    let response = HealthResponse {
        status,
        service: state.service_name.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        database,
    };
    (code, Json(response))
}
