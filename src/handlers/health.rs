use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET /-/healthy: liveness probe. Never touches the SendGrid API.
pub async fn healthy() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
