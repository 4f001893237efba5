//! # GET /healthz

use axum::Json;
use chrono::Utc;
use objgate_types::HealthResponse;

/// GET /healthz: ヘルスチェック。
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}
