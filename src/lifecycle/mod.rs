//! Process lifecycle controller.
//!
//! ```text
//! Starting ──connect ok──▶ Serving ──signal──▶ Draining ──closed + disconnect──▶ Stopped (exit 0)
//!    │                                            └──────── 10s deadline ──────▶ Stopped (exit 1)
//!    └──connect failed──▶ FatalStart ──disconnect──▶ Stopped (exit 1)
//! ```
//!
//! Only the first termination signal starts the drain; later ones are logged
//! and ignored, so the store handle is disconnected at most once.

use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};

use crate::database::ConnectionHandle;

pub mod signals;

pub use signals::Signal;

/// Hard deadline for a graceful shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Serving(SocketAddr),
    Draining,
    FatalStart,
    Stopped,
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// In-flight work finished and the store was disconnected.
    Graceful,
    /// The shutdown deadline elapsed first.
    Forced,
    /// Store connection or listener bind failed.
    StartupFailed,
    /// The server stopped without being asked to.
    ServerFailed,
}

impl ShutdownOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            ShutdownOutcome::Graceful => 0,
            _ => 1,
        }
    }
}

impl From<ShutdownOutcome> for ExitCode {
    fn from(outcome: ShutdownOutcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

pub struct Lifecycle {
    handle: Arc<dyn ConnectionHandle>,
    shutdown_timeout: Duration,
    phase: watch::Sender<Phase>,
}

impl Lifecycle {
    pub fn new(handle: Arc<dyn ConnectionHandle>) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self {
            handle,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
            phase,
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Observe phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Connect the store, serve `app` on `addr` and shut down on the first signal.
    pub async fn run(
        self,
        addr: SocketAddr,
        app: Router,
        mut signals: mpsc::Receiver<Signal>,
    ) -> ShutdownOutcome {
        self.phase.send_replace(Phase::Starting);

        if let Err(err) = self.handle.connect().await {
            error!(error = ?err, "❌ Failed to start server: database connection failed");
            return self.abort_startup().await;
        }

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!(%addr, error = %err, "❌ Failed to bind listener");
                return self.abort_startup().await;
            }
        };
        let local_addr = listener.local_addr().unwrap_or(addr);

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = drain_rx.await;
        });
        let mut server = tokio::spawn(server.into_future());
        let server_abort = server.abort_handle();

        self.phase.send_replace(Phase::Serving(local_addr));
        info!("🚀 Server running on {}", local_addr);

        tokio::select! {
            signal = signals.recv() => match signal {
                Some(signal) => info!("{} received. Starting graceful shutdown...", signal),
                None => warn!("Signal source closed. Starting graceful shutdown..."),
            },
            result = &mut server => {
                match result {
                    Ok(Ok(())) => error!("HTTP server stopped unexpectedly"),
                    Ok(Err(e)) => error!("HTTP server failed: {}", e),
                    Err(e) => error!("HTTP server task failed: {}", e),
                }
                self.handle.disconnect().await;
                self.phase.send_replace(Phase::Stopped);
                return ShutdownOutcome::ServerFailed;
            }
        }

        self.phase.send_replace(Phase::Draining);
        let _ = drain_tx.send(());

        let handle = Arc::clone(&self.handle);
        let drain = tokio::time::timeout(self.shutdown_timeout, async move {
            match server.await {
                Ok(Ok(())) => info!("✅ HTTP server closed"),
                Ok(Err(e)) => error!("HTTP server failed while draining: {}", e),
                Err(e) => error!("HTTP server task failed while draining: {}", e),
            }
            handle.disconnect().await;
        });
        tokio::pin!(drain);

        let outcome = loop {
            tokio::select! {
                result = &mut drain => break match result {
                    Ok(()) => ShutdownOutcome::Graceful,
                    Err(_) => {
                        error!("❌ Forced shutdown after timeout");
                        server_abort.abort();
                        ShutdownOutcome::Forced
                    }
                },
                Some(signal) = signals.recv() => {
                    warn!("{} received while shutting down, ignoring", signal);
                }
            }
        };

        self.phase.send_replace(Phase::Stopped);
        outcome
    }

    async fn abort_startup(&self) -> ShutdownOutcome {
        self.phase.send_replace(Phase::FatalStart);
        self.handle.disconnect().await;
        self.phase.send_replace(Phase::Stopped);
        ShutdownOutcome::StartupFailed
    }
}
