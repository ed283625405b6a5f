use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    error::ApiResult,
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Liveness probe with database connectivity
///
/// GET /api/v1/health
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.db.pool())
        .await
    {
        Ok(_) => DatabaseHealth {
            connected: true,
            message: "ok".to_string(),
        },
        Err(e) => DatabaseHealth {
            connected: false,
            message: e.to_string(),
        },
    };

    Ok(Json(HealthResponse {
        status: if database.connected { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database,
    }))
}
