use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get};

use crate::HealthResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check endpoint: verifies the fixture root is still readable
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Fixture storage unreadable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let identities = state.fixtures.identities().await;
    if let Err(err) = &identities {
        tracing::warn!(error = %err, "fixture storage unreadable");
    }

    let (status, http_status) = match &identities {
        Ok(_) => ("ok", StatusCode::OK),
        Err(_) => ("degraded", StatusCode::SERVICE_UNAVAILABLE),
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: state.sessions.len(),
            identities: identities.map(|ids| ids.len()).unwrap_or(0),
        }),
    )
}
