//! Application state shared across all handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;

/// Application state shared across handlers.
///
/// Both members are read-only after startup; the pool handles its own
/// connection sharing.
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration
    pub config: Arc<Config>,
    /// Process-wide PostgreSQL handle
    pub db: Arc<Database>,
}

impl axum::extract::FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

impl axum::extract::FromRef<AppState> for Arc<Database> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.db)
    }
}
