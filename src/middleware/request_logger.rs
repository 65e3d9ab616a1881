use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri, Version},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Environment;

/// Access log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `GET /health 200 0.412 ms - 57`
    Dev,
    /// Apache combined log format.
    Combined,
}

impl LogFormat {
    pub fn for_environment(environment: Environment) -> Self {
        if environment.is_development() {
            LogFormat::Dev
        } else {
            LogFormat::Combined
        }
    }
}

/// Request fields captured before the request is handed on.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub remote_addr: Option<SocketAddr>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestLine {
    pub fn capture(request: &Request) -> Self {
        let headers = request.headers();
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            remote_addr: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            referrer: header_text(headers, header::REFERER),
            user_agent: header_text(headers, header::USER_AGENT),
        }
    }

    pub fn dev(&self, status: StatusCode, elapsed: Duration, length: Option<u64>) -> String {
        format!(
            "{} {} {} {:.3} ms - {}",
            self.method,
            self.uri,
            status.as_u16(),
            elapsed.as_secs_f64() * 1000.0,
            length.map_or_else(|| "-".to_string(), |l| l.to_string()),
        )
    }

    pub fn combined(&self, status: StatusCode, length: Option<u64>, at: DateTime<Utc>) -> String {
        format!(
            "{} - - [{}] \"{} {} {:?}\" {} {} \"{}\" \"{}\"",
            self.remote_addr
                .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
            at.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.uri,
            self.version,
            status.as_u16(),
            length.map_or_else(|| "-".to_string(), |l| l.to_string()),
            self.referrer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn response_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
}

/// Request logging middleware: one access line per request.
pub async fn request_logger_middleware(
    State(format): State<LogFormat>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let line = RequestLine::capture(&request);
    let start = Instant::now();

    let mut response = next.run(request).await;

    let status = response.status();
    let length = response_length(&response);
    let message = match format {
        LogFormat::Dev => line.dev(status, start.elapsed(), length),
        LogFormat::Combined => line.combined(status, length, Utc::now()),
    };

    if status.is_server_error() {
        error!(request_id = %request_id, "{}", message);
    } else if status.is_client_error() {
        warn!(request_id = %request_id, "{}", message);
    } else {
        info!(request_id = %request_id, "{}", message);
    }

    // Add request ID to response headers for tracing
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }

    response
}
