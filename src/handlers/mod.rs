// Request handlers for the informational endpoints

pub mod health;
pub mod root;

pub use health::health_check;
pub use root::{not_found, root_info};

/// Public name reported by the informational endpoints.
pub const SERVICE_NAME: &str = "Kasroad Auth Server";

/// Version reported by the informational endpoints.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status reported once the server is accepting traffic.
pub const SERVICE_STATUS: &str = "ready";
