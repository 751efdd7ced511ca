//! metricsdash - real-time metrics aggregation and broadcast engine
//!
//! Ingests CPU / memory samples and per-request HTTP timings from an
//! instrumented process, keeps running aggregates of the HTTP timings and
//! pushes `{topic, payload}` snapshots to every connected dashboard viewer.

pub mod agent;
pub mod arguments;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod logger;
pub mod services;
pub mod signals;
#[cfg(feature = "web")]
pub mod webserver;

pub use dashboard::Dashboard;
pub use errors::DashError;
