use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::Environment;

/// Lifecycle operations of the process-wide store handle.
///
/// The lifecycle controller calls `connect` once before binding the listener
/// and `disconnect` once during teardown.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn disconnect(&self);
}

/// PostgreSQL pool shared by every request.
pub struct Database {
    pool: PgPool,
    closed: AtomicBool,
}

impl Database {
    /// Build the pool without opening any connection.
    pub fn new(database_url: &str, environment: Environment) -> Result<Self> {
        let mut options = PgConnectOptions::from_str(database_url)
            .context("DATABASE_URL is not a valid connection string")?;

        // sqlx logs every statement at debug by default; keep that for development only.
        if !environment.is_development() {
            options = options.disable_statement_logging();
        }

        if environment.is_production() && !enforces_tls(database_url) {
            warn!("Database connection does not enforce SSL. Consider adding sslmode=require to connection string");
        }

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .test_before_acquire(true)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionHandle for Database {
    async fn connect(&self) -> Result<()> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database connection test failed")?;
        info!("✅ Database connected successfully in {:?}", start.elapsed());
        Ok(())
    }

    async fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Database already disconnected");
            return;
        }
        self.pool.close().await;
        info!("✅ Database disconnected");
    }
}

static SHARED: OnceCell<Arc<Database>> = OnceCell::new();

/// Process-wide database handle.
///
/// The first call creates the pool; every later call returns the same
/// instance, so at most one pool exists per process. Consumers still receive
/// the handle explicitly through `AppState` rather than calling this.
pub fn shared(database_url: &str, environment: Environment) -> Result<Arc<Database>> {
    SHARED
        .get_or_try_init(|| Database::new(database_url, environment).map(Arc::new))
        .cloned()
}

fn enforces_tls(database_url: &str) -> bool {
    ["sslmode=require", "sslmode=verify-ca", "sslmode=verify-full"]
        .iter()
        .any(|mode| database_url.contains(mode))
}
