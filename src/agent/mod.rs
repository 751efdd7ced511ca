//! In-process instrumentation agent
//!
//! [`Monitor`] is the event source the dashboard subscribes to. Producers
//! (the resource [`sampler`], the HTTP middleware, or host code) call
//! [`Monitor::emit`]; every handler registered for the event's kind runs
//! inline on the emitting thread.
pub mod sampler;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dashboard::{EventHandler, EventKind, EventSource, SampleEvent};

pub use sampler::ResourceSampler;

pub struct Monitor {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
    environment: HashMap<String, String>,
}

impl Monitor {
    /// Monitor with environment data collected from the current process
    pub fn new() -> Self {
        Self::with_environment(collect_environment())
    }

    pub fn with_environment(environment: HashMap<String, String>) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            environment,
        }
    }

    /// Deliver `event` to every handler subscribed to its kind
    pub fn emit(&self, event: SampleEvent) {
        let handlers = {
            let guard = self.handlers.read();
            match guard.get(&event.kind()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for handler in handlers {
            handler.handle(&event);
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for Monitor {
    fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.write().entry(kind).or_default().push(handler);
    }

    fn environment_data(&self) -> HashMap<String, String> {
        self.environment.clone()
    }
}

/// Snapshot of the process environment taken once at startup
pub fn collect_environment() -> HashMap<String, String> {
    let mut data = HashMap::new();

    let command_line: Vec<String> = std::env::args().collect();
    data.insert("command.line".to_string(), command_line.join(" "));

    let hostname = sysinfo::System::host_name()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown".to_string());
    data.insert("environment.HOSTNAME".to_string(), hostname);

    let processors = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    data.insert("number.of.processors".to_string(), processors.to_string());
    data.insert("os.arch".to_string(), std::env::consts::ARCH.to_string());

    // Not shown by the dashboard, kept for host applications
    data.insert("os.name".to_string(), std::env::consts::OS.to_string());
    data.insert("pid".to_string(), std::process::id().to_string());
    data.insert(
        "agent.version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );

    data
}
