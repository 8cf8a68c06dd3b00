use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness check.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "healthy" })),
    )
}
