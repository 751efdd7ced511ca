use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use metricsdash::{
    agent::Monitor,
    arguments::{self, Arguments},
    config,
    dashboard::Dashboard,
    logger::{self, LogTag},
    services::{
        implementations::{FlusherService, SamplerService, WebserverService},
        ServiceManager,
    },
    signals,
    webserver::AppState,
};

/// Standalone metrics dashboard
///
/// Samples this process, serves the dashboard WebSocket endpoint and runs
/// until Ctrl-C / SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    arguments::set_arguments(args.clone());
    logger::init();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config::CONFIG_FILE_PATH.to_string());
    config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from '{}'", config_path))?;
    config::apply_overrides(&args);
    let cfg = config::get_config_clone();

    logger::info(
        LogTag::System,
        &format!("metricsdash {} starting", env!("CARGO_PKG_VERSION")),
    );

    let monitor = Arc::new(Monitor::new());
    let dashboard = Dashboard::new(monitor.clone(), &cfg.dashboard);
    let state = AppState::new(dashboard.clone(), monitor.clone(), CancellationToken::new());

    let mut manager = ServiceManager::new(cfg.clone());
    manager.register(Box::new(FlusherService::new(dashboard.clone())));
    manager.register(Box::new(SamplerService::new(
        monitor.clone(),
        Duration::from_millis(cfg.sampler.interval_ms.max(1)),
    )));
    manager.register(Box::new(WebserverService::new(state, cfg.webserver.clone())));

    if let Err(e) = manager.start_all().await {
        logger::error(LogTag::System, &format!("Startup failed: {}", e));
        let _ = manager.stop_all().await;
        return Err(e).context("Failed to start services");
    }

    signals::wait_for_shutdown_signal()
        .await
        .context("Failed to install signal handlers")?;
    logger::info(LogTag::System, "Shutdown signal received");

    manager
        .stop_all()
        .await
        .context("Failed to stop services")?;

    let metrics = dashboard.registry().metrics().snapshot();
    logger::info(
        LogTag::System,
        &format!(
            "Stopped after {} connections ({} messages sent, {} dropped)",
            metrics.total_connections, metrics.messages_sent, metrics.messages_dropped
        ),
    );
    Ok(())
}
