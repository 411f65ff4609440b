use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use super::weather::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the record store is unreachable
    pub status: String,
    pub version: String,
    /// Whether the record store answered
    pub database: bool,
    /// False while running on the placeholder "development" API key
    pub api_key_configured: bool,
}

impl HealthResponse {
    fn new(database: bool, api_key: &str) -> Self {
        Self {
            status: if database { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            api_key_configured: api_key != "development",
        }
    }
}

/// Report record store reachability. Always 200.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.store.ping().await;
    Json(HealthResponse::new(db_ok, &state.api_key))
}
