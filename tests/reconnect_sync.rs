mod common;

use common::{harness, write};
use offline_sync::application::ports::PendingWriteStore;
use offline_sync::application::services::{
    ConnectivitySignal, NetworkMonitor, OfflineClient, SyncCoordinator,
};
use offline_sync::domain::entities::{ConnectivityEvent, SyncTrigger};
use offline_sync::SubmitOutcome;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_pass(coordinator: &SyncCoordinator) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while coordinator.metrics().total_passes == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("no sync pass ran");
}

#[tokio::test]
async fn reconnect_drains_writes_captured_offline() {
    let h = harness().await;
    let signal = ConnectivitySignal::new(false);
    let monitor = Arc::new(NetworkMonitor::start(
        signal.subscribe(),
        Duration::from_millis(20),
    ));
    let auto_sync = h.coordinator.spawn_auto_sync(monitor.subscribe());
    let client = OfflineClient::new(
        h.store.clone(),
        h.fetcher.clone(),
        monitor.clone(),
        h.coordinator.clone(),
    );

    h.fetcher.set_online(false);
    for id in ["a", "b"] {
        let outcome = client.submit(write(id)).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued(_)));
    }
    assert!(h.fetcher.requests().is_empty());
    assert!(client.status().await.unwrap().has_data_to_sync);

    h.fetcher.set_online(true);
    signal.set(true);
    monitor.wait_until(true).await.unwrap();
    wait_for_pass(&h.coordinator).await;

    assert_eq!(h.store.count().await.unwrap(), 0);
    assert_eq!(h.fetcher.posted_ids(), vec!["a", "b"]);
    assert_eq!(
        h.coordinator.metrics().last_trigger,
        Some(SyncTrigger::Reconnect)
    );
    auto_sync.abort();
}

#[tokio::test]
async fn flapping_connection_settles_before_syncing() {
    let h = harness().await;
    h.store.enqueue(write("a")).await.unwrap();

    let signal = ConnectivitySignal::new(false);
    let monitor = NetworkMonitor::start(signal.subscribe(), Duration::from_millis(100));
    let mut events = monitor.subscribe();
    let auto_sync = h.coordinator.spawn_auto_sync(monitor.subscribe());

    for online in [true, false, true, false, true] {
        signal.set(online);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, ConnectivityEvent::BecameOnline);

    wait_for_pass(&h.coordinator).await;
    assert_eq!(h.store.count().await.unwrap(), 0);
    assert_eq!(h.coordinator.metrics().total_passes, 1);
    assert!(events.try_recv().is_err());
    auto_sync.abort();
}

#[tokio::test]
async fn reconnect_with_empty_queue_does_nothing() {
    let h = harness().await;
    let signal = ConnectivitySignal::new(false);
    let monitor = NetworkMonitor::start(signal.subscribe(), Duration::from_millis(10));
    let auto_sync = h.coordinator.spawn_auto_sync(monitor.subscribe());

    signal.set(true);
    monitor.wait_until(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.coordinator.metrics().total_passes, 0);
    assert!(h.fetcher.requests().is_empty());
    auto_sync.abort();
}
