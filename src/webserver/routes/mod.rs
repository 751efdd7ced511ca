use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::config;
use crate::dashboard::metrics::RegistryMetricsSnapshot;
use crate::logger::{self, LogTag};
use crate::webserver::{state::AppState, ws};

/// Dashboard routes at the configured `webserver.path`
pub fn dashboard_routes(state: AppState) -> Router {
    let path = config::with_config(|cfg| cfg.webserver.path.clone());
    dashboard_routes_at(state, &path)
}

/// Dashboard routes mounted at `path`
///
/// - `GET {path}`: WebSocket upgrade, one subscriber per socket
/// - `GET {path}/stats`: fan-out counters as JSON
pub fn dashboard_routes_at(state: AppState, path: &str) -> Router {
    let base = normalize_path(path);
    let stats = if base == "/" {
        "/stats".to_string()
    } else {
        format!("{}/stats", base)
    };

    Router::new()
        .route(&base, get(ws_upgrade))
        .route(&stats, get(stats_handler))
        .with_state(state)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    logger::debug(LogTag::Webserver, "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| ws::handle_connection(socket, state))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    connections: RegistryMetricsSnapshot,
    tracked_urls: usize,
    flush_cycles: u64,
    uptime_seconds: i64,
}

async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = &state.dashboard;
    Json(StatsResponse {
        connections: dashboard.registry().metrics().snapshot(),
        tracked_urls: dashboard.store().url_count(),
        flush_cycles: dashboard.flusher().completed_cycles(),
        uptime_seconds: (chrono::Utc::now() - state.startup_time).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/metricsdash"), "/metricsdash");
        assert_eq!(normalize_path("metricsdash/"), "/metricsdash");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
    }
}
