//! API routes mounted under `/api`.
//!
//! Only the index lives here; authentication routes are provided by the
//! collaborator router passed to `build_router_with_api`.

use axum::{response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::handlers::{SERVICE_NAME, SERVICE_STATUS, SERVICE_VERSION};

/// Path prefix owned by the API router.
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}

/// API version info
/// GET /api
pub async fn api_index() -> Json<ApiInfo> {
    Json(ApiInfo {
        name: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        status: SERVICE_STATUS.to_string(),
    })
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(API_PREFIX, get(api_index))
        .route("/api/", get(api_index))
}
