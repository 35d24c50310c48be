//! End-to-end flow over the simulated transport.

use callboard_realtime::{
    BackoffPolicy, CallEventData, CallEventType, ConnectionManager, ConnectionState, EventBus,
    InvalidationLog, NotificationLevel, NotificationLog, QueryKey, RealtimeBinding,
    SimulatedTransport,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(15);

struct Harness {
    bus: Arc<EventBus>,
    connection: Arc<ConnectionManager>,
    cache: Arc<InvalidationLog>,
    notifications: Arc<NotificationLog>,
}

fn harness(seed: u64) -> Harness {
    let bus = Arc::new(EventBus::new());
    let notifications = Arc::new(NotificationLog::new());
    let connection = Arc::new(ConnectionManager::new(
        Arc::new(SimulatedTransport::new(TICK).with_seed(seed)),
        bus.clone(),
        BackoffPolicy::default(),
        notifications.clone(),
    ));
    Harness {
        bus,
        connection,
        cache: Arc::new(InvalidationLog::new()),
        notifications,
    }
}

async fn wait_connected(connection: &ConnectionManager) {
    let mut state = connection.watch_state();
    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_one_tick_delivers_one_event_in_order() {
    let h = harness(5);
    let log = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        for event_type in CallEventType::ALL {
            let log = log.clone();
            h.bus.subscribe(event_type, move |event| {
                log.lock().push((tag, event.event_type));
                Ok(())
            });
        }
    }

    h.connection.connect().unwrap();
    wait_connected(&h.connection).await;
    tokio::time::sleep(TICK + Duration::from_millis(5)).await;

    let log = log.lock();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "first");
    assert_eq!(log[1].0, "second");
    assert_eq!(log[0].1, log[1].1);
    assert_eq!(h.bus.stats().total_emits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_the_ticker() {
    let h = harness(8);
    h.connection.connect().unwrap();
    wait_connected(&h.connection).await;

    tokio::time::sleep(TICK * 3 + Duration::from_millis(5)).await;
    assert_eq!(h.bus.stats().total_emits, 3);

    h.connection.disconnect();
    tokio::time::sleep(TICK * 10).await;
    assert_eq!(h.bus.stats().total_emits, 3);

    h.connection.connect().unwrap();
    wait_connected(&h.connection).await;
    tokio::time::sleep(TICK + Duration::from_millis(5)).await;
    assert_eq!(h.bus.stats().total_emits, 4);
}

#[tokio::test(start_paused = true)]
async fn test_binding_reacts_to_simulated_stream() {
    let h = harness(21);
    let binding = RealtimeBinding::new(
        h.bus.clone(),
        h.connection.clone(),
        h.cache.clone(),
        h.notifications.clone(),
    );
    binding.activate().unwrap();
    wait_connected(&h.connection).await;

    tokio::time::sleep(TICK * 20 + Duration::from_millis(5)).await;
    assert_eq!(h.bus.stats().total_emits, 20);
    assert!(h.cache.len() >= 20);

    binding.deactivate();
    let before = (h.cache.len(), h.notifications.len());
    tokio::time::sleep(TICK * 20).await;
    assert_eq!((h.cache.len(), h.notifications.len()), before);
}

#[tokio::test(start_paused = true)]
async fn test_call_started_scenario() {
    let h = harness(1);
    let binding = RealtimeBinding::new(
        h.bus.clone(),
        h.connection.clone(),
        h.cache.clone(),
        h.notifications.clone(),
    );
    binding.activate().unwrap();

    h.bus.emit_event(
        CallEventType::CallStarted,
        CallEventData::now().with_call_id("call_42"),
    );

    assert_eq!(
        h.cache.requests(),
        vec![QueryKey::Calls, QueryKey::LiveMonitoring]
    );
    let notifications = h.notifications.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Success);
    assert!(notifications[0].body.contains("call_42"));

    binding.deactivate();
    for event_type in CallEventType::ALL {
        h.bus
            .emit_event(event_type, CallEventData::now().with_call_id("call_43"));
    }
    assert_eq!(h.cache.len(), 2);
    assert_eq!(h.notifications.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_run_keeps_bounded_history() {
    let h = harness(34);
    let cache = Arc::new(InvalidationLog::with_capacity(50));
    let notifications = Arc::new(NotificationLog::with_capacity(20));
    let binding = RealtimeBinding::new(
        h.bus.clone(),
        h.connection.clone(),
        cache.clone(),
        notifications.clone(),
    );
    binding.activate().unwrap();
    wait_connected(&h.connection).await;

    tokio::time::sleep(TICK * 2_000 + Duration::from_millis(5)).await;

    assert_eq!(h.bus.stats().total_emits, 2_000);
    assert!(cache.len() >= 2_000);
    assert_eq!(cache.retained(), 50);
    assert!(notifications.len() > 20);
    assert_eq!(notifications.retained(), 20);
    assert_eq!(notifications.recent(100).len(), 20);

    binding.deactivate();
}
