use axum::{extract::State, response::Json};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, Environment};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub environment: Environment,
}

/// Basic health check endpoint
/// GET /health
pub async fn health_check(State(config): State<Arc<Config>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: config.environment,
    })
}
