/// Connection registry - subscriber tracking and isolated fan-out
///
/// Every subscriber owns a bounded outbound queue drained by its own
/// sender task, so `send` never blocks the caller. Overflow policy is
/// drop-newest: a message that does not fit is discarded for that
/// subscriber only and counted in the metrics.
///
/// Broadcast iterates under the read lock; add/remove take the write lock,
/// so a subscriber is never removed while a broadcast is sending to it.
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use super::metrics::RegistryMetrics;
use crate::logger::{self, LogTag};

// ============================================================================
// SUBSCRIBER
// ============================================================================

/// Connection ID (unique per registry)
pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// The outbound queue is full; the message was dropped
    #[error("outbound queue full")]
    Full,

    /// The connection is gone
    #[error("connection closed")]
    Closed,
}

/// A connected viewer
pub trait Subscriber: Send + Sync {
    fn id(&self) -> ConnectionId;

    /// Queue one text message without blocking
    fn send(&self, message: &Arc<str>) -> Result<(), SendError>;
}

/// Smallest outbound queue: room for the `env` and `title` greeting
pub const MIN_QUEUE_CAPACITY: usize = 2;

/// Subscriber backed by a bounded mpsc queue
pub struct ChannelSubscriber {
    id: ConnectionId,
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiving end its sender task drains
    ///
    /// `capacity` is raised to [`MIN_QUEUE_CAPACITY`].
    pub fn new(id: ConnectionId, capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(MIN_QUEUE_CAPACITY));
        (Arc::new(Self { id, tx }), rx)
    }
}

impl Subscriber for ChannelSubscriber {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, message: &Arc<str>) -> Result<(), SendError> {
        self.tx.try_send(Arc::clone(message)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub dropped: usize,
    pub failed: usize,
}

pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<dyn Subscriber>>>,
    next_conn_id: AtomicU64,
    metrics: RegistryMetrics,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
            metrics: RegistryMetrics::new(),
        }
    }

    /// Allocate a fresh connection ID
    pub fn next_id(&self) -> ConnectionId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn add(&self, subscriber: Arc<dyn Subscriber>) {
        let id = subscriber.id();
        let active = {
            let mut connections = self.connections.write();
            if connections.insert(id, subscriber).is_none() {
                self.metrics.connection_opened();
            }
            connections.len()
        };

        logger::debug(
            LogTag::Dashboard,
            &format!("Connection {} registered (active={})", id, active),
        );
    }

    /// Returns false when the connection was not registered
    pub fn remove(&self, id: ConnectionId) -> bool {
        let (removed, active) = {
            let mut connections = self.connections.write();
            let removed = connections.remove(&id).is_some();
            (removed, connections.len())
        };

        if removed {
            self.metrics.connection_closed();
            logger::debug(
                LogTag::Dashboard,
                &format!("Connection {} unregistered (active={})", id, active),
            );
        }
        removed
    }

    /// Send `message` to every registered subscriber
    ///
    /// A failing or panicking subscriber never affects the others and
    /// nothing propagates to the caller. Closed subscribers are removed
    /// once iteration is over.
    pub fn broadcast(&self, message: &str) -> BroadcastReport {
        let message: Arc<str> = Arc::from(message);
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        {
            let connections = self.connections.read();
            for (id, subscriber) in connections.iter() {
                let result = catch_unwind(AssertUnwindSafe(|| subscriber.send(&message)));
                match result {
                    Ok(Ok(())) => {
                        report.sent += 1;
                        self.metrics.message_sent();
                    }
                    Ok(Err(SendError::Full)) => {
                        report.dropped += 1;
                        self.metrics.message_dropped();
                        logger::debug(
                            LogTag::Dashboard,
                            &format!("Message dropped for connection {} (queue full)", id),
                        );
                    }
                    Ok(Err(SendError::Closed)) => {
                        report.failed += 1;
                        self.metrics.send_failed();
                        closed.push(*id);
                    }
                    Err(_) => {
                        report.failed += 1;
                        self.metrics.send_failed();
                        logger::warning(
                            LogTag::Dashboard,
                            &format!("Connection {}: send panicked, skipping", id),
                        );
                    }
                }
            }
        }

        for id in closed {
            self.remove(id);
        }

        report
    }

    /// Send `message` to one subscriber, outside the registry
    ///
    /// Used for per-connection messages to a handle that may not be
    /// registered yet. Panics are contained like in `broadcast`.
    pub fn send_to(&self, subscriber: &dyn Subscriber, message: &str) -> Result<(), SendError> {
        let message: Arc<str> = Arc::from(message);
        match catch_unwind(AssertUnwindSafe(|| subscriber.send(&message))) {
            Ok(Ok(())) => {
                self.metrics.message_sent();
                Ok(())
            }
            Ok(Err(SendError::Full)) => {
                self.metrics.message_dropped();
                Err(SendError::Full)
            }
            Ok(Err(SendError::Closed)) | Err(_) => {
                self.metrics.send_failed();
                Err(SendError::Closed)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().contains_key(&id)
    }

    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Subscriber that records every message it accepts
    pub(crate) struct RecordingSubscriber {
        id: ConnectionId,
        pub(crate) messages: Mutex<Vec<String>>,
    }

    impl RecordingSubscriber {
        pub(crate) fn new(id: ConnectionId) -> Arc<Self> {
            Arc::new(Self {
                id,
                messages: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn topics(&self) -> Vec<String> {
            self.messages
                .lock()
                .iter()
                .map(|m| {
                    let value: serde_json::Value = serde_json::from_str(m).unwrap();
                    value["topic"].as_str().unwrap().to_string()
                })
                .collect()
        }
    }

    impl Subscriber for RecordingSubscriber {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn send(&self, message: &Arc<str>) -> Result<(), SendError> {
            self.messages.lock().push(message.to_string());
            Ok(())
        }
    }

    struct FailingSubscriber {
        id: ConnectionId,
        error: SendError,
    }

    impl Subscriber for FailingSubscriber {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn send(&self, _message: &Arc<str>) -> Result<(), SendError> {
            Err(self.error)
        }
    }

    struct PanickingSubscriber(ConnectionId);

    impl Subscriber for PanickingSubscriber {
        fn id(&self) -> ConnectionId {
            self.0
        }

        fn send(&self, _message: &Arc<str>) -> Result<(), SendError> {
            panic!("socket exploded");
        }
    }

    #[test]
    fn test_registration() {
        let registry = ConnectionRegistry::new();
        let id1 = registry.next_id();
        let id2 = registry.next_id();
        assert_ne!(id1, id2);

        registry.add(RecordingSubscriber::new(id1));
        registry.add(RecordingSubscriber::new(id2));
        assert_eq!(registry.len(), 2);

        assert!(registry.remove(id1));
        assert!(!registry.remove(id1));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(id2));
        assert_eq!(registry.metrics().snapshot().active_connections, 1);
    }

    #[test]
    fn test_broadcast_isolates_failures() {
        let registry = ConnectionRegistry::new();
        let good_a = RecordingSubscriber::new(1);
        let good_b = RecordingSubscriber::new(4);
        registry.add(good_a.clone());
        registry.add(Arc::new(FailingSubscriber {
            id: 2,
            error: SendError::Full,
        }));
        registry.add(Arc::new(PanickingSubscriber(3)));
        registry.add(good_b.clone());

        let report = registry.broadcast("{\"topic\":\"cpu\",\"payload\":{}}");

        assert_eq!(report.sent, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(good_a.messages.lock().len(), 1);
        assert_eq!(good_b.messages.lock().len(), 1);
    }

    #[test]
    fn test_broadcast_removes_closed_subscribers() {
        let registry = ConnectionRegistry::new();
        registry.add(RecordingSubscriber::new(1));
        registry.add(Arc::new(FailingSubscriber {
            id: 2,
            error: SendError::Closed,
        }));

        let report = registry.broadcast("x");
        assert_eq!(report.failed, 1);
        assert!(!registry.contains(2));
        assert!(registry.contains(1));
    }

    #[tokio::test]
    async fn test_channel_subscriber_drops_newest_when_full() {
        let registry = ConnectionRegistry::new();
        let (subscriber, mut rx) = ChannelSubscriber::new(registry.next_id(), 2);
        registry.add(subscriber);

        registry.broadcast("one");
        registry.broadcast("two");
        let report = registry.broadcast("three");
        assert_eq!(report.dropped, 1);

        assert_eq!(&*rx.recv().await.unwrap(), "one");
        assert_eq!(&*rx.recv().await.unwrap(), "two");
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.metrics().snapshot().messages_dropped, 1);
    }

    #[tokio::test]
    async fn test_channel_subscriber_closed_after_receiver_drop() {
        let registry = ConnectionRegistry::new();
        let (subscriber, rx) = ChannelSubscriber::new(7, 4);
        registry.add(subscriber);
        drop(rx);

        registry.broadcast("gone");
        assert!(registry.is_empty());
    }
}
