use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use tower::ServiceExt;
use vcal_core::store::ReconnectPolicy;
use vcal_core::{EventDraft, EventStore, RemoteStore, RemoteStoreOptions, VcalError};
use vcal_server::{AppState, router, serve};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn options() -> RemoteStoreOptions {
    RemoteStoreOptions {
        request_timeout: Duration::from_secs(5),
        reconnect: ReconnectPolicy::new(Duration::from_millis(50), Duration::from_millis(200)),
    }
}

async fn start_server() -> (tempfile::TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(dir.path().join("events.json")).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(serve(listener, router(state, None), std::future::pending()));
    (dir, addr)
}

fn connect(addr: SocketAddr) -> RemoteStore {
    RemoteStore::connect(format!("ws://{}/ws", addr), options())
}

#[tokio::test]
async fn remote_store_round_trip() {
    let (_dir, addr) = start_server().await;
    let store = connect(addr);

    assert!(store.list_events().await.unwrap().is_empty());

    let created = store
        .create_event(EventDraft::new("Standup", date(2024, 3, 4)))
        .await
        .unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(store.list_events().await.unwrap(), vec![created.clone()]);

    let mut edited = created.clone();
    edited.title = "Standup (moved)".into();
    store.update_event(edited.clone()).await.unwrap();
    assert_eq!(store.list_events().await.unwrap(), vec![edited]);

    store.delete_event(&created.id).await.unwrap();
    store.delete_event("never-existed").await.unwrap();
    assert!(store.list_events().await.unwrap().is_empty());
}

#[tokio::test]
async fn remote_update_of_unknown_id_is_not_found() {
    let (_dir, addr) = start_server().await;
    let store = connect(addr);

    let ghost = vcal_core::Event::from_draft("ghost", EventDraft::new("Ghost", date(2024, 1, 1)));
    let err = store.update_event(ghost).await.unwrap_err();

    assert!(matches!(err, VcalError::NotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn changes_are_broadcast_to_other_clients() {
    let (_dir, addr) = start_server().await;
    let writer = connect(addr);
    let watcher = connect(addr);

    // Wait for the watcher's initial snapshot.
    assert!(watcher.list_events().await.unwrap().is_empty());
    let mut snapshots = watcher.subscribe();
    snapshots.borrow_and_update();

    let created = writer
        .create_event(EventDraft::new("Shared", date(2024, 5, 1)))
        .await
        .unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            snapshots.changed().await.unwrap();
            let events = snapshots.borrow_and_update().clone();
            if !events.is_empty() {
                return events;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(seen, vec![created]);
}

#[tokio::test]
async fn health_reports_event_count() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::open(dir.path().join("events.json")).await.unwrap();
    state
        .store
        .create_event(EventDraft::new("One", date(2024, 1, 1)))
        .await
        .unwrap();

    let response = router(state, None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["events"], 1);
}

#[tokio::test]
async fn serves_static_files_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let public = dir.path().join("public");
    std::fs::create_dir_all(&public).unwrap();
    std::fs::write(public.join("index.html"), "<h1>vcal</h1>").unwrap();

    let state = AppState::open(dir.path().join("events.json")).await.unwrap();
    let response = router(state, Some(public))
        .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
