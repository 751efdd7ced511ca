/// Sample events produced by the instrumentation agent
///
/// CPU and memory samples are pre-aggregated by the producer and are
/// forwarded to viewers unmodified; HTTP samples feed the aggregate store.
use serde::{Deserialize, Serialize};

/// Event kinds an event source can be subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Cpu,
    Memory,
    Http,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Cpu, EventKind::Memory, EventKind::Http];
}

/// CPU usage sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSample {
    /// Sample time (unix milliseconds)
    pub time: i64,
    /// Fraction of total CPU used by the process (0.0 - 1.0)
    pub process: f64,
    /// Fraction of total CPU used by the whole system (0.0 - 1.0)
    pub system: f64,
}

/// Memory usage sample (bytes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub time: i64,
    pub physical_total: u64,
    pub physical_used: u64,
    pub physical_free: u64,
    /// Process virtual address space size
    pub virtual_size: u64,
    /// Process private (non-shared) memory
    pub private_size: u64,
    /// Process resident memory
    pub physical: u64,
}

/// One completed HTTP request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSample {
    /// Request start time (unix milliseconds)
    pub time: i64,
    pub url: String,
    /// Request duration in milliseconds
    pub duration: f64,
    pub method: String,
    pub status_code: u16,
}

impl HttpSample {
    /// Shorthand for samples where only url and duration matter
    pub fn new(time: i64, url: impl Into<String>, duration: f64) -> Self {
        Self {
            time,
            url: url.into(),
            duration,
            method: "GET".to_string(),
            status_code: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleEvent {
    Cpu(CpuSample),
    Memory(MemorySample),
    Http(HttpSample),
}

impl SampleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SampleEvent::Cpu(_) => EventKind::Cpu,
            SampleEvent::Memory(_) => EventKind::Memory,
            SampleEvent::Http(_) => EventKind::Http,
        }
    }
}
