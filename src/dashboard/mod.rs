//! Metrics aggregation and broadcast engine
//!
//! ## Components
//! - `store`: running HTTP statistics (window + lifetime per-url table)
//! - `dispatcher`: routes producer events to the store or straight to viewers
//! - `registry`: connected subscribers and isolated fan-out
//! - `flusher`: periodic drain-and-broadcast task
//! - `lifecycle`: per-connection greeting (env + title) and cleanup
//! - `envelope`: `{topic, payload}` wire format
//!
//! [`Dashboard`] wires them together around one event source.
pub mod dispatcher;
pub mod envelope;
pub mod events;
pub mod flusher;
pub mod lifecycle;
pub mod metrics;
pub mod registry;
pub mod source;
pub mod store;

pub use envelope::{encode, Topic};
pub use events::{CpuSample, EventKind, HttpSample, MemorySample, SampleEvent};
pub use registry::{ChannelSubscriber, ConnectionId, ConnectionRegistry, SendError, Subscriber};
pub use source::{EventHandler, EventSource};
pub use store::{AggregateStore, UrlStat, WindowAggregate};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{self, DashboardConfig};
use dispatcher::EventDispatcher;
use envelope::TitlePayload;
use flusher::Flusher;
use lifecycle::LifecycleHandler;

/// One dashboard instance: aggregates, subscribers and the flush task
pub struct Dashboard {
    store: Arc<AggregateStore>,
    registry: Arc<ConnectionRegistry>,
    flusher: Arc<Flusher>,
    lifecycle: LifecycleHandler,
    queue_capacity: usize,
}

impl Dashboard {
    /// Build a dashboard and subscribe it to `source`
    pub fn new(source: Arc<dyn EventSource>, config: &DashboardConfig) -> Arc<Self> {
        let store = Arc::new(AggregateStore::with_url_warn_threshold(
            config.url_table_warn_threshold,
        ));
        let registry = Arc::new(ConnectionRegistry::new());

        let dispatcher = Arc::new(EventDispatcher::new(store.clone(), registry.clone()));
        dispatcher.attach(source.as_ref());

        let flusher = Arc::new(Flusher::new(
            store.clone(),
            registry.clone(),
            Duration::from_millis(config.flush_interval_ms.max(1)),
        ));

        let title = TitlePayload {
            title: config.title.clone(),
            docs: config.docs.clone(),
        };
        let lifecycle = LifecycleHandler::new(registry.clone(), source, title);

        Arc::new(Self {
            store,
            registry,
            flusher,
            lifecycle,
            queue_capacity: config.subscriber_queue_capacity,
        })
    }

    /// Build from the global configuration
    pub fn from_config(source: Arc<dyn EventSource>) -> Arc<Self> {
        let dashboard_config = config::with_config(|cfg| cfg.dashboard.clone());
        Self::new(source, &dashboard_config)
    }

    /// Open a queued connection
    ///
    /// Returns its id and the receiver a sender task must drain into the
    /// transport. `env` and `title` are already queued on return.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<Arc<str>>) {
        let id = self.registry.next_id();
        let (subscriber, rx) = ChannelSubscriber::new(id, self.queue_capacity);
        self.lifecycle.connected(subscriber);
        (id, rx)
    }

    /// Attach a caller-provided subscriber handle
    pub fn connect_subscriber(&self, subscriber: Arc<dyn Subscriber>) {
        self.lifecycle.connected(subscriber);
    }

    pub fn disconnect(&self, id: ConnectionId) {
        self.lifecycle.disconnected(id);
    }

    /// Spawn the periodic flush task
    pub fn start_flusher(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.flusher.spawn(cancel)
    }

    pub fn store(&self) -> &Arc<AggregateStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn flusher(&self) -> &Arc<Flusher> {
        &self.flusher
    }
}
