//! Application startup and initialization logic.

use std::sync::Arc;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::config::{Config, OAuthProvider};
use crate::database::Database;

/// Create the AppState and report which optional features are available.
pub fn initialize_app(config: Arc<Config>, db: Arc<Database>) -> AppState {
    report_oauth_providers(&config);
    report_email(&config);

    if config.direct_url.is_some() {
        info!("Direct database URL configured for schema tooling");
    }

    AppState { config, db }
}

fn report_oauth_providers(config: &Config) {
    for (provider, creds) in [
        (OAuthProvider::Google, &config.google),
        (OAuthProvider::GitHub, &config.github),
    ] {
        if creds.is_partial() {
            warn!(
                "OAuth provider {} has only one of client id/secret configured; it will be disabled",
                provider
            );
        }
    }

    let enabled = config.oauth_providers();
    if enabled.is_empty() {
        info!("No OAuth providers configured");
    } else {
        let names: Vec<String> = enabled.iter().map(ToString::to_string).collect();
        info!("✅ OAuth providers enabled: {}", names.join(", "));
    }
}

fn report_email(config: &Config) {
    let email = &config.email;
    if email.is_enabled() {
        info!(
            host = email.smtp_host.as_deref().unwrap_or_default(),
            port = ?email.smtp_port,
            secure = email.smtp_secure.unwrap_or(false),
            "✅ Email delivery configured"
        );
    } else {
        warn!("Email service disabled: SMTP_HOST and EMAIL_FROM are required for outbound email");
    }
}
