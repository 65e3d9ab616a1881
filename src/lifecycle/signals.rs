//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM are forwarded, every time they arrive, onto a
//! channel consumed by the lifecycle controller. Repeats are the controller's
//! business: only the first one starts a shutdown.

use std::fmt;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Install the handlers and return the stream of received signals.
pub fn listen() -> mpsc::Receiver<Signal> {
    let (tx, rx) = mpsc::channel(8);

    let interrupt_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                return;
            }
            if interrupt_tx.send(Signal::Interrupt).await.is_err() {
                return;
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                return;
            }
        };
        while terminate.recv().await.is_some() {
            if tx.send(Signal::Terminate).await.is_err() {
                return;
            }
        }
    });

    #[cfg(not(unix))]
    drop(tx);

    rx
}
