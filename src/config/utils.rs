/// Configuration utilities - loading and access helpers
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

use super::schemas::Config;
use crate::arguments::Arguments;
use crate::errors::DashError;
use crate::logger::{self, LogTag};

/// Global configuration instance
static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Load configuration from a specific file path
///
/// A missing file is not an error: defaults from the schemas are used.
pub fn load_config_from_path(path: &str) -> Result<(), DashError> {
    let config = read_config_file(path)?;
    install(config)
}

/// Parse a TOML document into a `Config`
pub fn parse_config(contents: &str) -> Result<Config, DashError> {
    toml::from_str::<Config>(contents)
        .map_err(|e| DashError::Config(format!("invalid configuration: {}", e)))
}

fn read_config_file(path: &str) -> Result<Config, DashError> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| DashError::Config(format!("failed to read '{}': {}", path, e)))?;
    let config = parse_config(&contents)?;

    logger::debug(LogTag::Config, &format!("Loaded configuration from '{}'", path));
    Ok(config)
}

fn install(config: Config) -> Result<(), DashError> {
    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| DashError::Config("config already initialized".to_string()))
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(args: &Arguments) {
    let Some(lock) = CONFIG.get() else {
        return;
    };
    let mut config = lock.write();
    if let Some(host) = &args.host {
        config.webserver.host = host.clone();
    }
    if let Some(port) = args.port {
        config.webserver.port = port;
    }
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when the configuration was never loaded, so
/// library users embedding the dashboard do not have to load a file.
///
/// ```
/// let interval = metricsdash::config::with_config(|cfg| cfg.dashboard.flush_interval_ms);
/// assert!(interval > 0);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    match CONFIG.get() {
        Some(lock) => f(&lock.read()),
        None => f(&Config::default()),
    }
}

/// Clone the whole configuration
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = parse_config(
            r#"
            [dashboard]
            flush_interval_ms = 500

            [webserver]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.dashboard.flush_interval_ms, 500);
        assert_eq!(config.dashboard.subscriber_queue_capacity, 256);
        assert_eq!(config.webserver.port, 9000);
        assert_eq!(config.webserver.path, "/metricsdash");
        assert!(config.sampler.enabled);
    }

    #[test]
    fn test_empty_document_equals_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = parse_config("[dashboard\nflush_interval_ms = ").unwrap_err();
        assert!(matches!(err, DashError::Config(_)));
    }

    #[test]
    fn test_read_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sampler]\ninterval_ms = 250").unwrap();

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.sampler.interval_ms, 250);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = read_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.dashboard.flush_interval_ms, 2000);
    }
}
