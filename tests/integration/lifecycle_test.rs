mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::get, Router};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;

use auth_server::config::Environment;
use auth_server::database::ConnectionHandle;
use auth_server::lifecycle::{Lifecycle, Phase, ShutdownOutcome, Signal, SHUTDOWN_TIMEOUT};
use auth_server::router::build_router;

use common::state_for;

#[derive(Default)]
struct MockHandle {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    fail_connect: bool,
    disconnect_delay: Option<Duration>,
}

impl MockHandle {
    fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    fn slow_disconnect(delay: Duration) -> Self {
        Self {
            disconnect_delay: Some(delay),
            ..Default::default()
        }
    }

    fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionHandle for MockHandle {
    async fn connect(&self) -> anyhow::Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.disconnect_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn any_port() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

async fn wait_until_serving(phases: &mut watch::Receiver<Phase>) -> SocketAddr {
    let phase = phases
        .wait_for(|phase| matches!(phase, Phase::Serving(_)))
        .await
        .unwrap();
    match *phase {
        Phase::Serving(addr) => addr,
        other => panic!("unexpected phase {:?}", other),
    }
}

/// Spawn the controller and wait until it is accepting connections.
async fn start(
    handle: Arc<MockHandle>,
    app: Router,
) -> (
    SocketAddr,
    mpsc::Sender<Signal>,
    watch::Receiver<Phase>,
    JoinHandle<ShutdownOutcome>,
) {
    let lifecycle = Lifecycle::new(handle);
    let mut phases = lifecycle.subscribe();
    let (signal_tx, signal_rx) = mpsc::channel(8);

    let task = tokio::spawn(lifecycle.run(any_port(), app, signal_rx));
    let addr = wait_until_serving(&mut phases).await;
    (addr, signal_tx, phases, task)
}

#[tokio::test]
async fn test_failed_connect_exits_with_failure() {
    let handle = Arc::new(MockHandle::failing());
    let lifecycle = Lifecycle::new(handle.clone());
    let phases = lifecycle.subscribe();
    let (_signal_tx, signal_rx) = mpsc::channel(1);

    let outcome = lifecycle
        .run(any_port(), build_router(state_for(Environment::Test)), signal_rx)
        .await;

    assert_eq!(outcome, ShutdownOutcome::StartupFailed);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(handle.connects.load(Ordering::SeqCst), 1);
    assert_eq!(handle.disconnects(), 1);
    assert_eq!(*phases.borrow(), Phase::Stopped);
}

#[tokio::test]
async fn test_bind_failure_exits_with_failure() {
    let taken = tokio::net::TcpListener::bind(any_port()).await.unwrap();
    let addr = taken.local_addr().unwrap();

    let handle = Arc::new(MockHandle::default());
    let (_signal_tx, signal_rx) = mpsc::channel(1);
    let outcome = Lifecycle::new(handle.clone())
        .run(addr, Router::new(), signal_rx)
        .await;

    assert_eq!(outcome, ShutdownOutcome::StartupFailed);
    assert_eq!(handle.disconnects(), 1);
}

#[tokio::test]
async fn test_signal_with_no_traffic_shuts_down_cleanly() {
    let handle = Arc::new(MockHandle::default());
    let (_addr, signal_tx, phases, task) =
        start(handle.clone(), build_router(state_for(Environment::Test))).await;

    signal_tx.send(Signal::Terminate).await.unwrap();
    let outcome = task.await.unwrap();

    assert_eq!(outcome, ShutdownOutcome::Graceful);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(handle.disconnects(), 1);
    assert_eq!(*phases.borrow(), Phase::Stopped);
}

#[tokio::test]
async fn test_serves_requests_until_signalled() {
    let handle = Arc::new(MockHandle::default());
    let (addr, signal_tx, _phases, task) =
        start(handle.clone(), build_router(state_for(Environment::Test))).await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["environment"], "test");
    assert_eq!(handle.disconnects(), 0);

    signal_tx.send(Signal::Interrupt).await.unwrap();
    assert_eq!(task.await.unwrap(), ShutdownOutcome::Graceful);
}

#[tokio::test]
async fn test_in_flight_request_completes_during_drain() {
    let started = Arc::new(Notify::new());
    let app = {
        let started = started.clone();
        Router::new().route(
            "/api/slow",
            get(move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    "done"
                }
            }),
        )
    };

    let handle = Arc::new(MockHandle::default());
    let (addr, signal_tx, mut phases, task) = start(handle.clone(), app).await;

    let request = tokio::spawn(reqwest::get(format!("http://{}/api/slow", addr)));
    started.notified().await;

    signal_tx.send(Signal::Terminate).await.unwrap();
    phases
        .wait_for(|phase| *phase != Phase::Serving(addr))
        .await
        .unwrap();

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "done");

    assert_eq!(task.await.unwrap(), ShutdownOutcome::Graceful);
    assert_eq!(handle.disconnects(), 1);
}

#[tokio::test]
async fn test_repeated_signals_disconnect_once() {
    let handle = Arc::new(MockHandle::slow_disconnect(Duration::from_millis(100)));
    let (_addr, signal_tx, mut phases, task) =
        start(handle.clone(), build_router(state_for(Environment::Test))).await;

    signal_tx.send(Signal::Interrupt).await.unwrap();
    phases
        .wait_for(|phase| matches!(phase, Phase::Draining | Phase::Stopped))
        .await
        .unwrap();
    let _ = signal_tx.send(Signal::Terminate).await;
    let _ = signal_tx.send(Signal::Interrupt).await;

    assert_eq!(task.await.unwrap(), ShutdownOutcome::Graceful);
    assert_eq!(handle.disconnects(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_forced_exit_after_deadline() {
    let handle = Arc::new(MockHandle::slow_disconnect(Duration::from_secs(60)));
    let (_addr, signal_tx, _phases, task) = start(handle.clone(), Router::new()).await;

    let began = tokio::time::Instant::now();
    signal_tx.send(Signal::Terminate).await.unwrap();
    let outcome = task.await.unwrap();

    assert_eq!(outcome, ShutdownOutcome::Forced);
    assert_eq!(outcome.exit_code(), 1);
    let elapsed = began.elapsed();
    assert!(elapsed >= SHUTDOWN_TIMEOUT);
    assert!(elapsed < SHUTDOWN_TIMEOUT + Duration::from_secs(1));
    assert_eq!(handle.disconnects(), 1);
}

#[tokio::test]
async fn test_custom_shutdown_timeout() {
    let handle = Arc::new(MockHandle::slow_disconnect(Duration::from_secs(30)));
    let lifecycle =
        Lifecycle::new(handle.clone()).with_shutdown_timeout(Duration::from_millis(50));
    let mut phases = lifecycle.subscribe();
    let (signal_tx, signal_rx) = mpsc::channel(1);

    let task = tokio::spawn(lifecycle.run(any_port(), Router::new(), signal_rx));
    wait_until_serving(&mut phases).await;

    signal_tx.send(Signal::Interrupt).await.unwrap();
    assert_eq!(task.await.unwrap(), ShutdownOutcome::Forced);
}

#[tokio::test]
async fn test_closed_signal_source_starts_shutdown() {
    let handle = Arc::new(MockHandle::default());
    let (_addr, signal_tx, _phases, task) = start(handle.clone(), Router::new()).await;

    drop(signal_tx);

    assert_eq!(task.await.unwrap(), ShutdownOutcome::Graceful);
    assert_eq!(handle.disconnects(), 1);
}
