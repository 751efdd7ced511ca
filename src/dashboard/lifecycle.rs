/// Per-connection lifecycle
///
/// A new subscriber gets its `env` and `title` messages before it is
/// registered for broadcasts, so those two always arrive first. Nothing
/// historical is replayed: aggregates reach a new viewer from the next
/// flush cycle on.
use std::collections::HashMap;
use std::sync::Arc;

use super::envelope::{self, EnvEntry, TitlePayload, Topic};
use super::registry::{ConnectionId, ConnectionRegistry, Subscriber};
use super::source::EventSource;
use crate::logger::{self, LogTag};

// ============================================================================
// ENVIRONMENT PARAMETERS
// ============================================================================

/// Environment parameters shown to viewers, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvParameter {
    CommandLine,
    Hostname,
    ProcessorCount,
    OsArchitecture,
}

impl EnvParameter {
    pub const ALL: [EnvParameter; 4] = [
        EnvParameter::CommandLine,
        EnvParameter::Hostname,
        EnvParameter::ProcessorCount,
        EnvParameter::OsArchitecture,
    ];

    /// Key in the event source's environment data
    pub fn key(&self) -> &'static str {
        match self {
            EnvParameter::CommandLine => "command.line",
            EnvParameter::Hostname => "environment.HOSTNAME",
            EnvParameter::ProcessorCount => "number.of.processors",
            EnvParameter::OsArchitecture => "os.arch",
        }
    }

    /// Label shown on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            EnvParameter::CommandLine => "Command Line",
            EnvParameter::Hostname => "Hostname",
            EnvParameter::ProcessorCount => "Number of Processors",
            EnvParameter::OsArchitecture => "OS Architecture",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

/// Map raw environment data onto the four displayed parameters
///
/// Unknown keys are ignored, missing ones become empty strings.
pub fn environment_entries(data: &HashMap<String, String>) -> Vec<EnvEntry> {
    let mut values: [String; 4] = Default::default();
    for (key, value) in data {
        if let Some(param) = EnvParameter::from_key(key) {
            values[param as usize] = value.clone();
        }
    }

    EnvParameter::ALL
        .iter()
        .zip(values)
        .map(|(param, value)| EnvEntry {
            parameter: param.label().to_string(),
            value,
        })
        .collect()
}

// ============================================================================
// HANDLER
// ============================================================================

pub struct LifecycleHandler {
    registry: Arc<ConnectionRegistry>,
    source: Arc<dyn EventSource>,
    title: TitlePayload,
}

impl LifecycleHandler {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        source: Arc<dyn EventSource>,
        title: TitlePayload,
    ) -> Self {
        Self {
            registry,
            source,
            title,
        }
    }

    /// Greet a new subscriber, then register it for broadcasts
    pub fn connected(&self, subscriber: Arc<dyn Subscriber>) {
        let id = subscriber.id();

        // Environment is re-queried on every connect, never cached
        let env = environment_entries(&self.source.environment_data());
        self.send_one(subscriber.as_ref(), Topic::Env, &env);
        self.send_one(subscriber.as_ref(), Topic::Title, &self.title);

        self.registry.add(subscriber);
        logger::debug(LogTag::Dashboard, &format!("Connection {} connected", id));
    }

    pub fn disconnected(&self, id: ConnectionId) {
        if self.registry.remove(id) {
            logger::debug(LogTag::Dashboard, &format!("Connection {} disconnected", id));
        }
    }

    fn send_one<T: serde::Serialize + ?Sized>(
        &self,
        subscriber: &dyn Subscriber,
        topic: Topic,
        payload: &T,
    ) {
        let message = match envelope::encode(topic, payload) {
            Ok(message) => message,
            Err(e) => {
                logger::error(LogTag::Dashboard, &e.to_string());
                return;
            }
        };

        if let Err(e) = self.registry.send_to(subscriber, &message) {
            logger::warning(
                LogTag::Dashboard,
                &format!(
                    "Connection {}: failed to send '{}' message: {}",
                    subscriber.id(),
                    topic,
                    e
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::events::EventKind;
    use crate::dashboard::registry::tests::RecordingSubscriber;
    use crate::dashboard::source::EventHandler;
    use parking_lot::Mutex;

    struct StaticSource {
        env: Mutex<HashMap<String, String>>,
    }

    impl EventSource for StaticSource {
        fn subscribe(&self, _kind: EventKind, _handler: Arc<dyn EventHandler>) {}

        fn environment_data(&self) -> HashMap<String, String> {
            self.env.lock().clone()
        }
    }

    fn title() -> TitlePayload {
        TitlePayload {
            title: "Application Metrics".to_string(),
            docs: "https://example.invalid".to_string(),
        }
    }

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_entries_order_and_defaults() {
        let data = env_map(&[
            ("os.arch", "x86_64"),
            ("environment.HOSTNAME", "web-1"),
            ("java.version", "ignored"),
        ]);

        let entries = environment_entries(&data);
        let labels: Vec<_> = entries.iter().map(|e| e.parameter.as_str()).collect();
        let values: Vec<_> = entries.iter().map(|e| e.value.as_str()).collect();

        assert_eq!(
            labels,
            ["Command Line", "Hostname", "Number of Processors", "OS Architecture"]
        );
        assert_eq!(values, ["", "web-1", "", "x86_64"]);
    }

    #[test]
    fn test_connected_sends_env_then_title_to_that_connection_only() {
        let registry = Arc::new(ConnectionRegistry::new());
        let source = Arc::new(StaticSource {
            env: Mutex::new(env_map(&[("number.of.processors", "8")])),
        });
        let handler = LifecycleHandler::new(registry.clone(), source, title());

        let existing = RecordingSubscriber::new(1);
        registry.add(existing.clone());

        let newcomer = RecordingSubscriber::new(2);
        handler.connected(newcomer.clone());

        assert_eq!(newcomer.topics(), ["env", "title"]);
        assert!(existing.messages.lock().is_empty());
        assert!(registry.contains(2));

        let env: serde_json::Value =
            serde_json::from_str(&newcomer.messages.lock()[0]).unwrap();
        assert_eq!(env["payload"][2]["Parameter"], "Number of Processors");
        assert_eq!(env["payload"][2]["Value"], "8");
    }

    #[test]
    fn test_environment_is_requeried_per_connect() {
        let registry = Arc::new(ConnectionRegistry::new());
        let source = Arc::new(StaticSource {
            env: Mutex::new(env_map(&[("environment.HOSTNAME", "old")])),
        });
        let handler = LifecycleHandler::new(registry, source.clone(), title());

        let first = RecordingSubscriber::new(1);
        handler.connected(first.clone());
        *source.env.lock() = env_map(&[("environment.HOSTNAME", "new")]);
        let second = RecordingSubscriber::new(2);
        handler.connected(second.clone());

        assert!(first.messages.lock()[0].contains("\"old\""));
        assert!(second.messages.lock()[0].contains("\"new\""));
    }

    #[test]
    fn test_disconnected_unregisters() {
        let registry = Arc::new(ConnectionRegistry::new());
        let source = Arc::new(StaticSource {
            env: Mutex::new(HashMap::new()),
        });
        let handler = LifecycleHandler::new(registry.clone(), source, title());

        handler.connected(RecordingSubscriber::new(5));
        handler.disconnected(5);
        assert!(registry.is_empty());
    }
}
