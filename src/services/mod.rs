mod health;
pub mod implementations;

pub use health::ServiceHealth;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::errors::DashError;
use crate::logger::{self, LogTag};

/// How long `stop_all` waits for each task after cancellation
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Core service trait that all services must implement
#[async_trait]
pub trait Service: Send + Sync {
    /// Unique service identifier
    fn name(&self) -> &'static str;

    /// Service priority (lower = starts earlier, stops later)
    fn priority(&self) -> i32 {
        100
    }

    /// Services this service depends on
    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Check if service is enabled in configuration
    fn is_enabled(&self, _config: &Config) -> bool {
        true
    }

    async fn initialize(&mut self) -> Result<(), DashError> {
        Ok(())
    }

    /// Start the service; returned tasks must exit once `cancel` fires
    async fn start(&mut self, cancel: CancellationToken) -> Result<Vec<JoinHandle<()>>, DashError>;

    async fn stop(&mut self) -> Result<(), DashError> {
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        ServiceHealth::Healthy
    }
}

pub struct ServiceManager {
    services: HashMap<&'static str, Box<dyn Service>>,
    handles: HashMap<&'static str, Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
    config: Config,
}

impl ServiceManager {
    pub fn new(config: Config) -> Self {
        Self {
            services: HashMap::new(),
            handles: HashMap::new(),
            shutdown: CancellationToken::new(),
            config,
        }
    }

    /// Register a service
    pub fn register(&mut self, service: Box<dyn Service>) {
        let name = service.name();
        self.services.insert(name, service);
    }

    /// Token cancelled by `stop_all`
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Start all enabled services in dependency and priority order
    pub async fn start_all(&mut self) -> Result<(), DashError> {
        logger::info(LogTag::Services, "Starting all services...");

        let enabled_services: Vec<&'static str> = self
            .services
            .iter()
            .filter(|(_, service)| service.is_enabled(&self.config))
            .map(|(name, _)| *name)
            .collect();

        logger::debug(
            LogTag::Services,
            &format!("Enabled services: {:?}", enabled_services),
        );

        let ordered = self.resolve_startup_order(&enabled_services)?;

        logger::info(
            LogTag::Services,
            &format!("Service startup order: {:?}", ordered),
        );

        for service_name in ordered {
            if let Some(service) = self.services.get_mut(service_name) {
                logger::debug(
                    LogTag::Services,
                    &format!("Initializing service: {}", service_name),
                );
                service.initialize().await?;

                let handles = service.start(self.shutdown.child_token()).await?;
                self.handles.insert(service_name, handles);

                logger::info(
                    LogTag::Services,
                    &format!("Service started: {}", service_name),
                );
            }
        }

        logger::info(LogTag::Services, "All services started");
        Ok(())
    }

    /// Stop all services in reverse startup order
    pub async fn stop_all(&mut self) -> Result<(), DashError> {
        logger::info(LogTag::Services, "Stopping all services...");

        self.shutdown.cancel();

        let running_services: Vec<&'static str> = self.handles.keys().copied().collect();
        let mut ordered = self.resolve_startup_order(&running_services)?;
        ordered.reverse();

        for service_name in ordered {
            if let Some(service) = self.services.get_mut(service_name) {
                if let Err(e) = service.stop().await {
                    logger::warning(
                        LogTag::Services,
                        &format!("Service stop error for {}: {}", service_name, e),
                    );
                }

                if let Some(handles) = self.handles.remove(service_name) {
                    for handle in handles {
                        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => logger::warning(
                                LogTag::Services,
                                &format!("Task of {} ended abnormally: {}", service_name, e),
                            ),
                            Err(_) => logger::warning(
                                LogTag::Services,
                                &format!(
                                    "Task of {} did not stop within {:?}",
                                    service_name, STOP_TIMEOUT
                                ),
                            ),
                        }
                    }
                }

                logger::info(
                    LogTag::Services,
                    &format!("Service stopped: {}", service_name),
                );
            }
        }

        logger::info(LogTag::Services, "All services stopped");
        Ok(())
    }

    /// Resolve service startup order
    fn resolve_startup_order(
        &self,
        services: &[&'static str],
    ) -> Result<Vec<&'static str>, DashError> {
        use std::collections::HashSet;

        let mut ordered = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        fn visit(
            name: &'static str,
            services: &HashMap<&'static str, Box<dyn Service>>,
            ordered: &mut Vec<&'static str>,
            visited: &mut HashSet<&'static str>,
            visiting: &mut HashSet<&'static str>,
        ) -> Result<(), DashError> {
            if visited.contains(name) {
                return Ok(());
            }

            if visiting.contains(name) {
                return Err(DashError::Service {
                    name,
                    message: "circular dependency".to_string(),
                });
            }

            visiting.insert(name);

            if let Some(service) = services.get(name) {
                for dep in service.dependencies() {
                    visit(dep, services, ordered, visited, visiting)?;
                }
            }

            visiting.remove(name);
            visited.insert(name);
            ordered.push(name);

            Ok(())
        }

        for &service_name in services {
            visit(
                service_name,
                &self.services,
                &mut ordered,
                &mut visited,
                &mut visiting,
            )?;
        }

        // Stable sort keeps dependency order among equal priorities
        ordered.sort_by_key(|name| {
            self.services
                .get(name)
                .map(|s| s.priority())
                .unwrap_or(100)
        });

        Ok(ordered)
    }

    pub async fn get_health(&self) -> HashMap<&'static str, ServiceHealth> {
        let mut health = HashMap::new();
        for (name, service) in &self.services {
            health.insert(*name, service.health().await);
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Probe {
        name: &'static str,
        priority: i32,
        deps: Vec<&'static str>,
        enabled: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn boxed(
            name: &'static str,
            priority: i32,
            deps: Vec<&'static str>,
            log: &Arc<Mutex<Vec<String>>>,
        ) -> Box<Self> {
            Box::new(Self {
                name,
                priority,
                deps,
                enabled: true,
                log: log.clone(),
            })
        }
    }

    #[async_trait]
    impl Service for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn dependencies(&self) -> Vec<&'static str> {
            self.deps.clone()
        }

        fn is_enabled(&self, _config: &Config) -> bool {
            self.enabled
        }

        async fn start(
            &mut self,
            cancel: CancellationToken,
        ) -> Result<Vec<JoinHandle<()>>, DashError> {
            self.log.lock().push(format!("start:{}", self.name));
            let log = self.log.clone();
            let name = self.name;
            Ok(vec![tokio::spawn(async move {
                cancel.cancelled().await;
                log.lock().push(format!("exit:{}", name));
            })])
        }

        async fn stop(&mut self) -> Result<(), DashError> {
            self.log.lock().push(format!("stop:{}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_order_follows_priority() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(Probe::boxed("webserver", 30, vec![], &log));
        manager.register(Probe::boxed("flusher", 10, vec![], &log));
        manager.register(Probe::boxed("sampler", 20, vec![], &log));

        manager.start_all().await.unwrap();
        assert_eq!(
            *log.lock(),
            ["start:flusher", "start:sampler", "start:webserver"]
        );
        assert!(manager.is_running("sampler"));

        log.lock().clear();
        manager.stop_all().await.unwrap();

        let stops: Vec<String> = log
            .lock()
            .iter()
            .filter(|entry| entry.starts_with("stop:"))
            .cloned()
            .collect();
        assert_eq!(stops, ["stop:webserver", "stop:sampler", "stop:flusher"]);
        assert_eq!(log.lock().iter().filter(|e| e.starts_with("exit:")).count(), 3);
        assert!(!manager.is_running("sampler"));
    }

    #[tokio::test]
    async fn test_disabled_service_not_started() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        let mut disabled = Probe::boxed("sampler", 20, vec![], &log);
        disabled.enabled = false;
        manager.register(disabled);
        manager.register(Probe::boxed("flusher", 10, vec![], &log));

        manager.start_all().await.unwrap();
        assert_eq!(*log.lock(), ["start:flusher"]);
        manager.stop_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_circular_dependency_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(Probe::boxed("a", 10, vec!["b"], &log));
        manager.register(Probe::boxed("b", 10, vec!["a"], &log));

        let err = manager.start_all().await.unwrap_err();
        assert!(err.to_string().contains("circular dependency"));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_health_reported_per_service() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new(Config::default());
        manager.register(Probe::boxed("flusher", 10, vec![], &log));

        let health = manager.get_health().await;
        assert_eq!(health.get("flusher"), Some(&ServiceHealth::Healthy));
    }
}
