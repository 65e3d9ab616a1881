use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::error::Error as StdError;
use tracing::debug;

use crate::error::AppError;

/// Largest body accepted by the parser (100 KiB).
pub const BODY_LIMIT: usize = 100 * 1024;

/// Decoded request body, available to every handler behind the parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody(pub Value);

impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ParsedBody>()
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" || mime.ends_with("+json") {
            Some(BodyKind::Json)
        } else if mime == "application/x-www-form-urlencoded" {
            Some(BodyKind::UrlEncoded)
        } else {
            None
        }
    }
}

/// Decode JSON and URL-encoded bodies before routing.
///
/// The raw bytes are put back on the request so `Json`/`Form` extractors
/// downstream keep working.
pub async fn parse_body(request: Request, next: Next) -> Result<Response, AppError> {
    let Some(kind) = BodyKind::of(request.headers()) else {
        return Ok(next.run(request).await);
    };

    let declared_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > BODY_LIMIT) {
        return Err(AppError::payload_too_large());
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| {
            if exceeds_limit(&e) {
                AppError::payload_too_large()
            } else {
                AppError::bad_request("Invalid request body")
            }
        })?;

    let value = if bytes.is_empty() {
        Value::Object(Map::new())
    } else {
        match kind {
            BodyKind::Json => serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                debug!(error = %e, "Rejected malformed JSON body");
                AppError::bad_request(format!("Invalid JSON format in request body: {}", e))
            })?,
            BodyKind::UrlEncoded => decode_form(&bytes),
        }
    };

    parts.extensions.insert(ParsedBody(value));
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(request).await)
}

/// Bodies without a declared length only hit the limit while being read.
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err as &(dyn StdError + 'static));
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// URL-encoded pairs as a JSON object; repeated keys become arrays.
fn decode_form(bytes: &[u8]) -> Value {
    let mut object = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(object)
}
