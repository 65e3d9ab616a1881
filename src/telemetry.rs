//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::Environment;

/// Default filter when `RUST_LOG` is not set.
pub fn default_directives(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "auth_server=debug,tower_http=debug,sqlx=warn",
        Environment::Production => "auth_server=info,tower_http=info,sqlx=error",
        Environment::Test => "auth_server=info,sqlx=error",
    }
}

/// Initialize tracing: compact human output in development and test, JSON lines in production.
pub fn init(environment: Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if environment.is_production() {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}
