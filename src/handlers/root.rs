use axum::{http::Uri, response::Json};
use serde::{Deserialize, Serialize};

use super::{SERVICE_NAME, SERVICE_STATUS, SERVICE_VERSION};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Endpoints {
    pub health: String,
    pub api: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub status: String,
    pub endpoints: Endpoints,
}

/// Root welcome endpoint
/// GET /
pub async fn root_info() -> Json<RootResponse> {
    Json(RootResponse {
        name: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        status: SERVICE_STATUS.to_string(),
        endpoints: Endpoints {
            health: "/health".to_string(),
            api: "/api".to_string(),
        },
    })
}

/// Fallback for requests no route matched.
pub async fn not_found(uri: Uri) -> AppError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    AppError::route_not_found(path)
}
