use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Environment;

pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned for unexpected errors in production.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Failure raised while handling a request.
///
/// `Operational` errors are anticipated and safe to show to the caller as-is.
/// Anything else is `Unexpected`: always logged, and only described in
/// detail outside production.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Operational { status: StatusCode, message: String },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Error attached to a response until the error mapper renders it.
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<AppError>);

impl AppError {
    pub fn operational(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Operational {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, message)
    }

    /// No stage matched the request.
    pub fn route_not_found(path: &str) -> Self {
        Self::not_found(format!("Route {} not found", path))
    }

    pub fn payload_too_large() -> Self {
        Self::operational(StatusCode::PAYLOAD_TOO_LARGE, "Request entity too large")
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, AppError::Operational { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Operational { status, .. } => *status,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing body for the given runtime mode.
    pub fn to_body(&self, environment: Environment) -> ErrorBody {
        match self {
            AppError::Operational { message, .. } => ErrorBody {
                status: "error".to_string(),
                message: message.clone(),
                stack: None,
            },
            AppError::Unexpected(_) if environment.is_production() => ErrorBody {
                status: "error".to_string(),
                message: GENERIC_ERROR_MESSAGE.to_string(),
                stack: None,
            },
            AppError::Unexpected(err) => ErrorBody {
                status: "error".to_string(),
                message: err.to_string(),
                // anyhow's Debug output carries the cause chain and, when captured, the backtrace.
                stack: Some(format!("{:?}", err)),
            },
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Unexpected(anyhow::Error::new(err))
    }
}

/// Malformed bodies seen by `Json` extractors in API routes are the caller's fault.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(e) => {
                AppError::bad_request(format!("Invalid JSON format: {}", e.body_text()))
            }
            JsonRejection::JsonDataError(e) => {
                AppError::operational(StatusCode::UNPROCESSABLE_ENTITY, e.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => AppError::operational(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "JSON content type required",
            ),
            other => AppError::operational(other.status(), other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Production-safe until the error mapper re-renders it for the actual mode.
        let body = self.to_body(Environment::Production);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(RaisedError(Arc::new(self)));
        response
    }
}
