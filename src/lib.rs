pub mod app_state;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod router;
pub mod startup;
pub mod telemetry;

pub use app_state::AppState;
pub use config::Config;
pub use error::AppError;
