/// Health reported by a running service
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceHealth {
    Healthy,

    /// Running, but losing work (for example dropped subscriber messages)
    Degraded(String),

    /// The service's task is gone
    Unhealthy(String),
}
