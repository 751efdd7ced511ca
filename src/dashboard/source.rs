/// Collaborator seams towards the instrumentation agent
use std::collections::HashMap;
use std::sync::Arc;

use super::events::{EventKind, SampleEvent};

/// Receives events from an [`EventSource`]
///
/// Called inline on the producer's thread; implementations must not block.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &SampleEvent);
}

/// Producer of CPU, memory and HTTP events
pub trait EventSource: Send + Sync {
    /// Register `handler` for every future event of `kind`
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>);

    /// Current environment key/value pairs (queried on every new connection)
    fn environment_data(&self) -> HashMap<String, String>;
}
