use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dashboard::Dashboard;
use crate::errors::DashError;
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};

/// Periodic drain-and-broadcast of the HTTP aggregates
pub struct FlusherService {
    dashboard: Arc<Dashboard>,
}

impl FlusherService {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }
}

#[async_trait]
impl Service for FlusherService {
    fn name(&self) -> &'static str {
        "flusher"
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn start(&mut self, cancel: CancellationToken) -> Result<Vec<JoinHandle<()>>, DashError> {
        logger::info(
            LogTag::Dashboard,
            &format!(
                "Flusher running every {:?}",
                self.dashboard.flusher().interval()
            ),
        );
        Ok(vec![self.dashboard.start_flusher(cancel)])
    }

    async fn health(&self) -> ServiceHealth {
        let metrics = self.dashboard.registry().metrics().snapshot();
        if metrics.messages_dropped > 0 {
            ServiceHealth::Degraded(format!(
                "{} messages dropped on full subscriber queues",
                metrics.messages_dropped
            ))
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
    use crate::dashboard::{HttpSample, SampleEvent};
    use std::collections::HashMap;
    use std::time::Duration;

    #[tokio::test]
    async fn test_flusher_service_drains_and_stops() {
        let monitor = Arc::new(Monitor::with_environment(HashMap::new()));
        let config = DashboardConfig {
            flush_interval_ms: 10,
            ..DashboardConfig::default()
        };
        let dashboard = Dashboard::new(monitor.clone(), &config);
        let (_id, mut rx) = dashboard.connect();
        monitor.emit(SampleEvent::Http(HttpSample::new(1, "/a", 3.0)));

        let mut service = FlusherService::new(dashboard.clone());
        let cancel = CancellationToken::new();
        let handles = service.start(cancel.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(dashboard.store().peek_window().is_empty());
        assert!(dashboard.flusher().completed_cycles() >= 1);

        let mut topics = Vec::new();
        while let Ok(message) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&message).unwrap();
            topics.push(value["topic"].as_str().unwrap().to_string());
        }
        assert_eq!(&topics[..3], ["env", "title", "http"]);
        assert_eq!(service.health().await, ServiceHealth::Healthy);
    }
}
