/// Message envelope and topic payloads
///
/// Every outbound message is a single JSON text `{"topic": ..., "payload": ...}`.
use serde::{Deserialize, Serialize};
use std::fmt;

use super::store::WindowAggregate;
use crate::errors::DashError;

// ============================================================================
// TOPIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Cpu,
    Memory,
    Http,
    HttpUrls,
    Env,
    Title,
}

impl Topic {
    /// Topic string used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Topic::Cpu => "cpu",
            Topic::Memory => "memory",
            Topic::Http => "http",
            Topic::HttpUrls => "httpURLs",
            Topic::Env => "env",
            Topic::Title => "title",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// ENVELOPE
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize + ?Sized> {
    pub topic: &'static str,
    pub payload: &'a T,
}

/// Wrap `payload` under `topic` and serialize to one text message
pub fn encode<T: Serialize + ?Sized>(topic: Topic, payload: &T) -> Result<String, DashError> {
    let envelope = Envelope {
        topic: topic.code(),
        payload,
    };
    serde_json::to_string(&envelope).map_err(|source| DashError::Encode {
        topic: topic.code(),
        source,
    })
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// `http` payload: statistics of one flush window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpAggregatePayload {
    /// Start of the window (time of its first request)
    pub time: i64,
    /// Url of the longest request
    pub url: String,
    pub longest: f64,
    pub average: f64,
    pub total: u64,
}

impl From<&WindowAggregate> for HttpAggregatePayload {
    fn from(window: &WindowAggregate) -> Self {
        Self {
            time: window.window_start_time,
            url: window.peak_url.clone(),
            longest: window.peak_duration,
            average: window.mean_duration,
            total: window.count,
        }
    }
}

/// One element of the `httpURLs` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlAverage {
    pub url: String,
    pub average_response_time: f64,
}

/// One element of the `env` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvEntry {
    #[serde(rename = "Parameter")]
    pub parameter: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// `title` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitlePayload {
    pub title: String,
    pub docs: String,
}
