use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, WebserverConfig};
use crate::errors::DashError;
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};
use crate::webserver::{self, AppState};

/// Standalone WebSocket server for the dashboard
pub struct WebserverService {
    state: AppState,
    config: WebserverConfig,
    started: bool,
    /// Cleared when the serve task returns
    serving: Arc<AtomicBool>,
}

impl WebserverService {
    pub fn new(state: AppState, config: WebserverConfig) -> Self {
        Self {
            state,
            config,
            started: false,
            serving: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Service for WebserverService {
    fn name(&self) -> &'static str {
        "webserver"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["flusher"]
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.webserver.enabled
    }

    async fn start(&mut self, cancel: CancellationToken) -> Result<Vec<JoinHandle<()>>, DashError> {
        // Bind here so a taken port fails startup instead of a background task
        let listener = webserver::bind_listener(&self.config.host, self.config.port).await?;
        let app = webserver::build_app(self.state.clone(), &self.config.path);

        let serving = Arc::clone(&self.serving);
        serving.store(true, Ordering::Release);
        self.started = true;

        let handle = tokio::spawn(async move {
            if let Err(e) = webserver::serve(listener, app, cancel).await {
                logger::error(LogTag::Webserver, &format!("Webserver failed: {}", e));
            }
            serving.store(false, Ordering::Release);
        });

        Ok(vec![handle])
    }

    async fn stop(&mut self) -> Result<(), DashError> {
        // Serve only returns once upgraded sockets are gone
        self.state.shutdown.cancel();
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        if self.started && !self.serving.load(Ordering::Acquire) {
            ServiceHealth::Unhealthy("webserver task exited".to_string())
        } else {
            ServiceHealth::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Monitor;
    use crate::config::DashboardConfig;
    use crate::dashboard::Dashboard;
    use std::sync::Arc;

    fn service(port: u16) -> WebserverService {
        let monitor = Arc::new(Monitor::with_environment(Default::default()));
        let dashboard = Dashboard::new(monitor.clone(), &DashboardConfig::default());
        let state = AppState::new(dashboard, monitor, CancellationToken::new());
        let config = WebserverConfig {
            port,
            ..WebserverConfig::default()
        };
        WebserverService::new(state, config)
    }

    #[tokio::test]
    async fn test_start_fails_when_port_taken() {
        let taken = webserver::bind_listener("127.0.0.1", 0).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut service = service(port);
        let err = service.start(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DashError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_start_and_cancel() {
        let mut service = service(0);
        let cancel = CancellationToken::new();
        let handles = service.start(cancel.clone()).await.unwrap();
        assert_eq!(service.health().await, ServiceHealth::Healthy);

        cancel.cancel();
        service.stop().await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(matches!(service.health().await, ServiceHealth::Unhealthy(_)));
    }
}
