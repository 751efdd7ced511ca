/// Shared application state for the dashboard routes
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::agent::Monitor;
use crate::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,

    /// Event source fed by the HTTP middleware
    pub monitor: Arc<Monitor>,

    /// Open sockets are closed when this fires
    pub shutdown: CancellationToken,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(dashboard: Arc<Dashboard>, monitor: Arc<Monitor>, shutdown: CancellationToken) -> Self {
        Self {
            dashboard,
            monitor,
            shutdown,
            startup_time: chrono::Utc::now(),
        }
    }
}
