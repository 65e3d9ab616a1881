use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use auth_server::config::Config;
use auth_server::lifecycle::{self, Lifecycle, ShutdownOutcome};
use auth_server::{database, router, startup, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file first
    dotenvy::dotenv().ok();

    // Nothing else starts until the environment is valid
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("{}", err.report());
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(config.environment);
    info!("📍 Environment: {}", config.environment);

    let db = match database::shared(&config.database_url, config.environment) {
        Ok(db) => db,
        Err(err) => {
            error!(error = ?err, "❌ Failed to start server");
            return ExitCode::FAILURE;
        }
    };

    let app_state = startup::initialize_app(Arc::clone(&config), Arc::clone(&db));
    let app = router::build_router(app_state);

    let outcome = Lifecycle::new(db)
        .run(config.listen_addr(), app, lifecycle::signals::listen())
        .await;

    if outcome == ShutdownOutcome::Forced {
        // Do not wait for the runtime to wind down in-flight work.
        std::process::exit(i32::from(outcome.exit_code()));
    }

    outcome.into()
}
