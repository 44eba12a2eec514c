use crate::domain::entities::ConnectivityEvent;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 64;

/// Raw platform connectivity input. Cloneable handle over a watch channel.
#[derive(Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    pub fn new(initial: bool) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    pub fn current(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

struct MonitorInner {
    state: watch::Sender<bool>,
    events: broadcast::Sender<ConnectivityEvent>,
}

impl MonitorInner {
    fn publish(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if !changed {
            return;
        }

        let event = ConnectivityEvent::from_online(online);
        tracing::info!(target: "offline::network", event = event.as_str(), "connectivity changed");
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Debounced view of the platform connectivity signal.
///
/// Raw changes are settled on the trailing edge: the monitor waits until the
/// signal has been quiet for the debounce window and publishes only if the
/// settled value differs from the last published one.
pub struct NetworkMonitor {
    state: watch::Receiver<bool>,
    events: broadcast::Sender<ConnectivityEvent>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    pub fn start(mut signal: watch::Receiver<bool>, debounce: Duration) -> Self {
        let initial = *signal.borrow_and_update();
        let (state_tx, state) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let task_inner = MonitorInner {
            state: state_tx,
            events: events.clone(),
        };

        let task = tokio::spawn(async move {
            loop {
                if signal.changed().await.is_err() {
                    break;
                }
                loop {
                    match tokio::time::timeout(debounce, signal.changed()).await {
                        Ok(Ok(())) => continue,
                        Ok(Err(_)) | Err(_) => break,
                    }
                }
                let settled = *signal.borrow_and_update();
                task_inner.publish(settled);
            }
            tracing::debug!(target: "offline::network", "connectivity signal closed");
        });

        tracing::info!(target: "offline::network", online = initial, "network monitor started");
        Self {
            state,
            events,
            task,
        }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.clone()
    }

    /// Resolves once the published state equals `online`. Fails if the
    /// connectivity signal closes first.
    pub async fn wait_until(&self, online: bool) -> Result<(), AppError> {
        let mut rx = self.watch();
        rx.wait_for(|current| *current == online)
            .await
            .map(|_| ())
            .map_err(|_| AppError::Internal("connectivity signal closed".to_string()))
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
