use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agent::{Monitor, ResourceSampler};
use crate::config::Config;
use crate::errors::DashError;
use crate::services::Service;

/// Built-in CPU / memory producer
pub struct SamplerService {
    monitor: Arc<Monitor>,
    interval: Duration,
}

impl SamplerService {
    pub fn new(monitor: Arc<Monitor>, interval: Duration) -> Self {
        Self { monitor, interval }
    }
}

#[async_trait]
impl Service for SamplerService {
    fn name(&self) -> &'static str {
        "sampler"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["flusher"]
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.sampler.enabled
    }

    async fn start(&mut self, cancel: CancellationToken) -> Result<Vec<JoinHandle<()>>, DashError> {
        let sampler = Arc::new(ResourceSampler::new(self.interval));
        Ok(vec![sampler.spawn(self.monitor.clone(), cancel)])
    }
}
