use devportal_core::store;
use devportal_core::testing::{GatedTokenEndpoint, TestSession, token_response};
use devportal_core::{CredentialSet, ExpiryMonitor, SessionConfig, SessionState};
use futures::channel::mpsc;
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use tokio::task::LocalSet;

const NOW: i64 = 1_700_000_000_000;
const PAGE: &str = "https://portal.example.com/";

fn expiring_session() -> (
    TestSession<GatedTokenEndpoint>,
    futures::channel::oneshot::Sender<devportal_core::SessionResult<devportal_core::TokenResponse>>,
) {
    let (endpoint, release) = GatedTokenEndpoint::pair();
    let session = TestSession::with_endpoint(
        SessionConfig::new("https://auth.example.com", "client-1"),
        PAGE,
        NOW,
        Rc::new(endpoint),
    );
    let set = CredentialSet {
        identity_token: "t1".into(),
        access_token: "t1".into(),
        refresh_token: Some("r1".into()),
        expires_at: NOW + 30_000,
    };
    store::save(&*session.store, &set).unwrap();
    (session, release)
}

fn spawn_local(task: LocalBoxFuture<'static, ()>) {
    tokio::task::spawn_local(task);
}

/// Let every spawned local task run to its next await point
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_overlapping_ticks_issue_one_refresh() {
    LocalSet::new()
        .run_until(async {
            let (session, release) = expiring_session();
            let (ticks, tick_rx) = mpsc::unbounded::<()>();
            let monitor = ExpiryMonitor::start(session.manager.clone(), tick_rx, spawn_local);

            ticks.unbounded_send(()).unwrap();
            settle().await;
            assert_eq!(session.endpoint.calls(), 1);
            assert!(matches!(
                session.manager.state(),
                SessionState::Refreshing { .. }
            ));

            ticks.unbounded_send(()).unwrap();
            settle().await;
            assert_eq!(session.endpoint.calls(), 1);

            release.send(Ok(token_response("t2", 3600))).unwrap();
            settle().await;
            assert_eq!(session.manager.bearer_token().as_deref(), Some("t2"));
            assert!(monitor.is_running());
        })
        .await;
}

#[tokio::test]
async fn test_stopped_monitor_ignores_ticks() {
    LocalSet::new()
        .run_until(async {
            let (session, _release) = expiring_session();
            let (ticks, tick_rx) = mpsc::unbounded::<()>();
            let monitor = ExpiryMonitor::start(session.manager.clone(), tick_rx, spawn_local);

            monitor.stop();
            monitor.stop();
            assert!(!monitor.is_running());

            let _ = ticks.unbounded_send(());
            settle().await;
            assert_eq!(session.endpoint.calls(), 0);
        })
        .await;
}

#[tokio::test]
async fn test_dropping_monitor_stops_it() {
    LocalSet::new()
        .run_until(async {
            let (session, _release) = expiring_session();
            let (ticks, tick_rx) = mpsc::unbounded::<()>();
            drop(ExpiryMonitor::start(
                session.manager.clone(),
                tick_rx,
                spawn_local,
            ));

            let _ = ticks.unbounded_send(());
            settle().await;
            assert_eq!(session.endpoint.calls(), 0);
            assert_eq!(session.manager.state(), SessionState::Unauthenticated);
        })
        .await;
}
