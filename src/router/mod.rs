//! Router configuration module.
//!
//! Stage order is fixed: security headers, error mapping, CORS, body parsing,
//! request logging, panic capture, then the routes and the 404 fallback. The
//! error mapper sits just inside the security headers so it also renders
//! errors raised by the CORS, body-parsing and logging stages.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::app_state::AppState;
use crate::handlers;
use crate::middleware::{
    add_security_headers, cors_layer, error_mapper_middleware, handle_panic, parse_body,
    request_logger_middleware, LogFormat,
};

pub mod api;

pub use api::{api_routes, API_PREFIX};

/// Build the application router with the built-in API index only.
pub fn build_router(app_state: AppState) -> Router {
    build_router_with_api(app_state, Router::new())
}

/// Build the application router, merging `collaborator` routes into the API.
///
/// Collaborator routes use full paths below `/api` (e.g. `/api/auth/session`).
pub fn build_router_with_api(app_state: AppState, collaborator: Router<AppState>) -> Router {
    let environment = app_state.config.environment;

    Router::new()
        .route("/", get(handlers::root_info))
        .route("/health", get(handlers::health_check))
        .merge(api_routes().merge(collaborator))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(add_security_headers))
                .layer(from_fn_with_state(environment, error_mapper_middleware))
                .layer(cors_layer(&app_state.config))
                .layer(from_fn(parse_body))
                .layer(from_fn_with_state(
                    LogFormat::for_environment(environment),
                    request_logger_middleware,
                ))
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .with_state(app_state)
}
