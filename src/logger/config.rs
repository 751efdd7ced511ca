/// Logger configuration and its global instance
use std::collections::HashSet;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;

/// Runtime logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Highest level that is printed
    pub min_level: LogLevel,

    /// Tags with DEBUG output enabled (debug keys)
    pub debug_tags: HashSet<String>,

    /// Restrict output to these tags (empty = all)
    pub enabled_tags: HashSet<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Debug,
            debug_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Get a copy of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build the logger configuration from parsed command-line arguments
pub fn init_from_args() {
    let args = arguments::get_arguments();

    let mut config = LoggerConfig::default();
    if args.quiet {
        config.min_level = LogLevel::Error;
    } else if args.verbose {
        config.min_level = LogLevel::Verbose;
    }

    for tag in LogTag::ALL {
        if arguments::is_debug_enabled_for(tag) {
            config.debug_tags.insert(tag.to_debug_key());
        }
    }

    set_logger_config(config);
}

pub(super) fn is_debug_enabled_for_tag(config: &LoggerConfig, tag: &LogTag) -> bool {
    config.min_level == LogLevel::Verbose || config.debug_tags.contains(&tag.to_debug_key())
}
