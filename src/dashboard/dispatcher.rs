/// Event dispatcher - routes producer events
///
/// - CPU / memory: encoded and broadcast immediately (already aggregated
///   by the producer)
/// - HTTP: folded into the aggregate store, visible at the next flush
use serde::Serialize;
use std::sync::Arc;

use super::envelope::{self, Topic};
use super::events::{EventKind, SampleEvent};
use super::registry::ConnectionRegistry;
use super::source::{EventHandler, EventSource};
use super::store::AggregateStore;
use crate::logger::{self, LogTag};

pub struct EventDispatcher {
    store: Arc<AggregateStore>,
    registry: Arc<ConnectionRegistry>,
}

impl EventDispatcher {
    pub fn new(store: Arc<AggregateStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Subscribe this dispatcher to every event kind of `source`
    pub fn attach(self: &Arc<Self>, source: &dyn EventSource) {
        for kind in EventKind::ALL {
            source.subscribe(kind, Arc::clone(self) as Arc<dyn EventHandler>);
        }
    }

    fn forward<T: Serialize>(&self, topic: Topic, payload: &T) {
        // Nothing to encode for an empty audience
        if self.registry.is_empty() {
            return;
        }

        match envelope::encode(topic, payload) {
            Ok(message) => {
                self.registry.broadcast(&message);
            }
            Err(e) => logger::error(LogTag::Dashboard, &e.to_string()),
        }
    }
}

impl EventHandler for EventDispatcher {
    fn handle(&self, event: &SampleEvent) {
        match event {
            SampleEvent::Cpu(sample) => self.forward(Topic::Cpu, sample),
            SampleEvent::Memory(sample) => self.forward(Topic::Memory, sample),
            SampleEvent::Http(sample) => self.store.record_http(sample),
        }
    }
}
