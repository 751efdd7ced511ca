/// Configuration schemas - all sections defined once with defaults
use crate::config_struct;

// ============================================================================
// DASHBOARD CONFIGURATION
// ============================================================================

config_struct! {
    /// Aggregation, flush cadence and fan-out
    pub struct DashboardConfig {
        /// Delay between the end of one flush cycle and the start of the next
        flush_interval_ms: u64 = 2000,

        /// Bounded outbound queue per subscriber (drop-newest on overflow, at least 2)
        subscriber_queue_capacity: usize = 256,

        /// Log a warning once the lifetime URL table reaches this many entries
        url_table_warn_threshold: usize = 10_000,

        /// Constant `title` message sent to every new subscriber
        title: String = "Application Metrics for Rust".to_string(),
        docs: String = "https://docs.rs/metricsdash".to_string(),
    }
}

// ============================================================================
// WEBSERVER CONFIGURATION
// ============================================================================

config_struct! {
    /// Standalone dashboard server
    pub struct WebserverConfig {
        enabled: bool = true,
        host: String = "127.0.0.1".to_string(),
        port: u16 = 8080,

        /// WebSocket endpoint path
        path: String = "/metricsdash".to_string(),
    }
}

// ============================================================================
// SAMPLER CONFIGURATION
// ============================================================================

config_struct! {
    /// Built-in CPU / memory sampler
    pub struct SamplerConfig {
        enabled: bool = true,
        interval_ms: u64 = 2000,
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    pub struct Config {
        dashboard: DashboardConfig = DashboardConfig::default(),
        webserver: WebserverConfig = WebserverConfig::default(),
        sampler: SamplerConfig = SamplerConfig::default(),
    }
}
