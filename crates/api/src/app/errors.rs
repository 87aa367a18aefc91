use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use siftledger_auth::AuthError;
use siftledger_core::DomainError;
use siftledger_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Domain(e) => domain_error_to_response(e),
        EngineError::Busy {
            seller_id,
            waited_ms,
        } => {
            tracing::warn!(seller_id = %seller_id, waited_ms, "request rejected: seller busy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({
                    "error": "busy",
                    "message": format!("seller is busy, retry shortly (waited {waited_ms} ms)"),
                    "retry_after_ms": waited_ms.max(1),
                })),
            )
                .into_response()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation { field, .. } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": message,
                "field": field,
            })),
        )
            .into_response(),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({
                "error": "not_found",
                "message": message,
                "entity": entity,
                "id": id,
            })),
        )
            .into_response(),
        DomainError::InsufficientStock {
            product_id,
            product_name,
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "conflict",
                "message": message,
                "product_id": product_id,
                "product_name": product_name,
                "available": available,
                "requested": requested,
            })),
        )
            .into_response(),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

/// Body that failed to deserialize (bad JSON, wrong field types, missing content type).
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    tracing::debug!(error = %rejection, "request body rejected");
    json_error(rejection.status(), "invalid_body", rejection.body_text())
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
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
