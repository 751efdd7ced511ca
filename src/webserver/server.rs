/// Standalone dashboard server
///
/// Used when the host application does not mount the dashboard routes
/// itself. Binding is split from serving so a failed bind surfaces from
/// service startup instead of inside a background task.
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::errors::DashError;
use crate::logger::{self, LogTag};
use crate::webserver::{middleware, routes, state::AppState};

/// Bind the dashboard listener
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, DashError> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| DashError::Config(format!("Invalid bind address {}:{}: {}", host, port, e)))?;

    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            let hint = match e.kind() {
                std::io::ErrorKind::AddrInUse => format!(
                    "Address {} already in use. Another metricsdash instance or \
                     application is listening there; pick a different --port.",
                    addr
                ),
                std::io::ErrorKind::PermissionDenied => format!(
                    "Port {} requires elevated privileges on this system. \
                     Consider using a port above 1024.",
                    port
                ),
                _ => format!("Failed to bind to {}: {}", addr, e),
            };
            logger::error(LogTag::Webserver, &hint);
            Err(DashError::Bind { addr, source: e })
        }
    }
}

/// Dashboard routes at `path`, instrumented, with permissive CORS
pub fn build_app(state: AppState, path: &str) -> Router {
    let monitor = state.monitor.clone();
    let app = routes::dashboard_routes_at(state, path);
    middleware::instrument(app, monitor).layer(CorsLayer::permissive())
}

/// Serve until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    app: Router,
    cancel: CancellationToken,
) -> Result<(), DashError> {
    if let Ok(addr) = listener.local_addr() {
        logger::info(
            LogTag::Webserver,
            &format!("Dashboard listening on ws://{}", addr),
        );
    }

    let shutdown_signal = async move {
        cancel.cancelled().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| DashError::Server(e.to_string()))?;

    logger::info(LogTag::Webserver, "Webserver stopped");
    Ok(())
}
