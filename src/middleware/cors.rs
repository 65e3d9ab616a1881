use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;

/// Cross-origin policy.
///
/// Production only accepts the origin of the public auth URL. Other modes
/// mirror the request origin, which behaves like "any origin" but stays
/// compatible with credentialed requests.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    if !config.environment.is_production() {
        return base.allow_origin(AllowOrigin::mirror_request());
    }

    let origin = config.allowed_origin();
    match origin.parse::<HeaderValue>() {
        Ok(value) => {
            info!("CORS: restricting cross-origin requests to {}", origin);
            base.allow_origin(AllowOrigin::list([value]))
        }
        Err(_) => {
            warn!(
                "CORS: invalid origin derived from BETTER_AUTH_URL ({}), denying all cross-origin requests",
                origin
            );
            base.allow_origin(AllowOrigin::list(Vec::<HeaderValue>::new()))
        }
    }
}
