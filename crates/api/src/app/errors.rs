use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use tallybank_core::{DomainError, FieldErrors};

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(fields) => validation_error(fields),
        DomainError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Account not found."),
        DomainError::InsufficientFunds => {
            json_error(StatusCode::FORBIDDEN, "insufficient_funds", "Insufficient funds")
        }
        DomainError::TransferFailed(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "transfer_failed", msg)
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Storage(msg) => {
            error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "An internal error occurred.",
            )
        }
        DomainError::Unauthorized => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthenticated.")
        }
    }
}

/// 422 with per-field messages.
pub fn validation_error(fields: FieldErrors) -> axum::response::Response {
    let message = fields
        .first_message()
        .unwrap_or("The given data was invalid.")
        .to_string();
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(json!({
            "error": "validation_error",
            "message": message,
            "errors": fields,
        })),
    )
        .into_response()
}

/// Unparseable or non-JSON bodies are reported as validation failures.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(
        StatusCode::UNPROCESSABLE_ENTITY,
        "invalid_json",
        rejection.body_text(),
    )
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
