//! WebSocket transport tests against an in-process server.

use callboard_realtime::{
    BackoffPolicy, CallEventType, ConnectionManager, ConnectionState, EventBus, NotificationLevel,
    NotificationLog, Transport, TransportError, WebSocketTransport,
};
use futures_util::SinkExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const STARTED: &str = r#"{"type":"call_started","data":{"call_id":"call_1","agent_id":"agent_2","timestamp":"2024-05-01T10:00:00Z"}}"#;
const ENDED: &str = r#"{"type":"call_ended","data":{"call_id":"call_1","timestamp":"2024-05-01T10:05:00Z","details":{"duration":300}}}"#;

/// Accept one client, send `frames`, then close.
async fn serve_once(frames: Vec<Message>) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(None).await;
    });

    (format!("ws://{}", addr), server)
}

#[tokio::test]
async fn test_receives_well_formed_events_only() {
    let (url, server) = serve_once(vec![
        Message::text("not json"),
        Message::text(r#"{"type":"call_parked","data":{"timestamp":"2024-05-01T10:00:00Z"}}"#),
        Message::Ping(vec![1u8, 2, 3].into()),
        Message::text(STARTED),
        Message::binary(ENDED.as_bytes().to_vec()),
    ])
    .await;

    let transport = WebSocketTransport::new(url);
    let mut session = transport.connect().await.unwrap();

    let first = session.next_event().await.unwrap();
    assert_eq!(first.event_type, CallEventType::CallStarted);
    assert_eq!(first.data.call_id.as_deref(), Some("call_1"));
    assert_eq!(first.data.agent_id.as_deref(), Some("agent_2"));

    let second = session.next_event().await.unwrap();
    assert_eq!(second.event_type, CallEventType::CallEnded);
    assert_eq!(second.data.details.unwrap()["duration"], 300);

    assert!(session.next_event().await.is_err());
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = WebSocketTransport::new(format!("ws://{}", addr));
    let result = transport.connect().await;
    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
}

#[tokio::test]
async fn test_manager_forwards_then_fails_after_drop() {
    let (url, server) = serve_once(vec![Message::text(STARTED), Message::text(ENDED)]).await;

    let bus = Arc::new(EventBus::new());
    let notifications = Arc::new(NotificationLog::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    for event_type in CallEventType::ALL {
        let seen = seen.clone();
        bus.subscribe(event_type, move |event| {
            seen.lock().push(event.event_type);
            Ok(())
        });
    }

    let manager = ConnectionManager::new(
        Arc::new(WebSocketTransport::new(url)),
        bus.clone(),
        BackoffPolicy::new(Duration::from_millis(20), 1),
        notifications.clone(),
    );
    manager.connect().unwrap();

    let mut state = manager.watch_state();
    tokio::time::timeout(
        Duration::from_secs(10),
        state.wait_for(|s| *s == ConnectionState::Failed),
    )
    .await
    .expect("manager should give up once the server is gone")
    .unwrap();

    assert_eq!(
        *seen.lock(),
        vec![CallEventType::CallStarted, CallEventType::CallEnded]
    );
    assert_eq!(notifications.count(NotificationLevel::Error), 1);
    server.await.unwrap();
}

/// Accept TCP connections and never answer the handshake.
async fn silent_listener() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            held.push(stream);
        }
    });

    (format!("ws://{}", addr), server)
}

#[tokio::test]
async fn test_handshake_timeout() {
    let (url, server) = silent_listener().await;

    let transport =
        WebSocketTransport::new(url).with_connect_timeout(Duration::from_millis(100));
    let result = tokio::time::timeout(Duration::from_secs(5), transport.connect())
        .await
        .expect("handshake should be bounded");
    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));

    server.abort();
}

#[tokio::test]
async fn test_manager_gives_up_on_silent_peer() {
    let (url, server) = silent_listener().await;

    let notifications = Arc::new(NotificationLog::new());
    let manager = ConnectionManager::new(
        Arc::new(WebSocketTransport::new(url).with_connect_timeout(Duration::from_millis(50))),
        Arc::new(EventBus::new()),
        BackoffPolicy::new(Duration::from_millis(10), 2),
        notifications.clone(),
    );
    manager.connect().unwrap();

    let mut state = manager.watch_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::Failed),
    )
    .await
    .expect("manager should give up on a peer that never completes the handshake")
    .unwrap();

    assert_eq!(manager.attempts(), 2);
    assert_eq!(notifications.count(NotificationLevel::Error), 1);
    server.abort();
}

#[tokio::test]
async fn test_idle_session_is_dropped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(STARTED)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let transport = WebSocketTransport::new(format!("ws://{}", addr))
        .with_idle_timeout(Duration::from_millis(100));
    let mut session = transport.connect().await.unwrap();

    let event = session.next_event().await.unwrap();
    assert_eq!(event.event_type, CallEventType::CallStarted);

    let result = tokio::time::timeout(Duration::from_secs(5), session.next_event())
        .await
        .expect("idle session should end");
    assert!(matches!(result, Err(TransportError::Socket(_))));

    server.abort();
}
