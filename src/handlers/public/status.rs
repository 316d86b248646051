// handlers/public/status.rs - Service banner and health probe

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

pub async fn root_get() -> ApiResult {
    Ok(ApiResponse::ok().with(
        "service",
        json!({
            "name": "CareLink API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "public": ["/signup", "/login", "/getcaretakers", "/health"],
                "protected": [
                    "/credentials", "/requests", "/update-status/:requestId",
                    "/addtasks", "/tasks", "/addmedication", "/medication",
                    "/addcontacts", "/chat", "/addmetrics", "/metrics", "/upload"
                ]
            }
        }),
    ))
}

pub async fn health_get(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database temporarily unavailable",
                    "status": "degraded",
                    "timestamp": now
                })),
            )
        }
    }
}
