use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use tracing::{error, warn};

use crate::config::Environment;
use crate::error::{AppError, RaisedError};

/// Terminal error-mapping stage.
///
/// Renders any `AppError` raised further in for the current runtime mode.
/// Responses without a raised error pass through untouched.
pub async fn error_mapper_middleware(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(RaisedError(raised)) = response.extensions().get::<RaisedError>().cloned() else {
        return response;
    };

    match raised.as_ref() {
        AppError::Operational { status, message } => {
            if status.is_server_error() {
                error!(status = %status, "{}", message);
            } else {
                warn!(status = %status, "{}", message);
            }
        }
        AppError::Unexpected(err) => {
            error!(error = ?err, "❌ Unexpected Error: {}", err);
        }
    }

    let body = match serde_json::to_vec(&raised.to_body(environment)) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to serialize error body: {}", e);
            return response;
        }
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}

/// Turn a handler panic into an unexpected error for the mapper to render.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Unexpected(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}
