/// Error types for the dashboard engine
///
/// Library code returns `Result<_, DashError>`; the binary wraps these in
/// `anyhow` for top-level reporting.
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    /// A payload could not be serialized into an envelope
    #[error("failed to encode '{topic}' message: {source}")]
    Encode {
        topic: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration could not be read, parsed or accessed
    #[error("configuration error: {0}")]
    Config(String),

    /// The dashboard listener could not bind
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server terminated with an error
    #[error("server error: {0}")]
    Server(String),

    /// A service failed to start or stop
    #[error("service '{name}' failed: {message}")]
    Service { name: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_mentions_topic() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DashError::Encode {
            topic: "http",
            source,
        };
        assert!(err.to_string().starts_with("failed to encode 'http' message"));
    }

    #[test]
    fn test_service_error_display() {
        let err = DashError::Service {
            name: "flusher",
            message: "already running".to_string(),
        };
        assert_eq!(err.to_string(), "service 'flusher' failed: already running");
    }
}
