use axum::http::StatusCode;

/// Handler for `GET /healthz`: process liveness only.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
