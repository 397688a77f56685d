use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use medfind_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::InvalidRequest(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_request", msg),
        EngineError::InvalidFilter(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_filter", msg),
        EngineError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        err @ EngineError::InsufficientStock { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock", err.to_string())
        }
        EngineError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        EngineError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "store unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "storage is temporarily unavailable")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
