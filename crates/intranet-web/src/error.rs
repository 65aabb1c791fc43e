//! Maps flow failures and domain `AppError`s to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use intranet_core::error::{AppError, ErrorKind};

use crate::flow::FlowError;

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Status code and machine-readable code for an error kind.
pub fn status_for(kind: &ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::MissingArgument | ErrorKind::Validation => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        ErrorKind::NotSupported => (StatusCode::NOT_FOUND, "NOT_SUPPORTED"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::ExternalService => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
        ErrorKind::ValueNotSet
        | ErrorKind::Serialization
        | ErrorKind::DataProtection
        | ErrorKind::Configuration
        | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

fn app_error_response(error: &AppError) -> Response {
    let (status, code) = status_for(&error.kind);
    if status.is_server_error() {
        tracing::error!(kind = %error.kind, error = %error.message, "Request failed");
    }

    let body = ApiErrorResponse {
        error: code.to_string(),
        message: error.message.clone(),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            FlowError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
            FlowError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message),
            FlowError::Internal(error) => return app_error_response(&error),
        };

        let body = ApiErrorResponse {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
