/// Core logging implementation with automatic filtering
use super::config::{get_logger_config, is_debug_enabled_for_tag, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Anything above the minimum level is dropped
/// 3. Debug requires --debug-<tag> (or --verbose)
/// 4. If enabled_tags is non-empty, the tag must be in it
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    should_log_with(&get_logger_config(), tag, level)
}

pub(super) fn should_log_with(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug && !is_debug_enabled_for_tag(config, tag) {
        return false;
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag.to_debug_key()) {
        return false;
    }

    true
}

/// Filter, then hand off to the formatter
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_always_logged() {
        let config = LoggerConfig {
            min_level: LogLevel::Error,
            ..LoggerConfig::default()
        };
        assert!(should_log_with(&config, &LogTag::Dashboard, LogLevel::Error));
        assert!(!should_log_with(&config, &LogTag::Dashboard, LogLevel::Warning));
    }

    #[test]
    fn test_debug_gated_per_tag() {
        let mut config = LoggerConfig::default();
        config.debug_tags.insert("dashboard".to_string());

        assert!(should_log_with(&config, &LogTag::Dashboard, LogLevel::Debug));
        assert!(!should_log_with(&config, &LogTag::Webserver, LogLevel::Debug));
        assert!(should_log_with(&config, &LogTag::Webserver, LogLevel::Info));
    }

    #[test]
    fn test_verbose_enables_all_debug() {
        let config = LoggerConfig {
            min_level: LogLevel::Verbose,
            ..LoggerConfig::default()
        };
        assert!(should_log_with(&config, &LogTag::Sampler, LogLevel::Debug));
        assert!(should_log_with(&config, &LogTag::Sampler, LogLevel::Verbose));
    }

    #[test]
    fn test_enabled_tags_filter() {
        let mut config = LoggerConfig::default();
        config.enabled_tags.insert("webserver".to_string());

        assert!(should_log_with(&config, &LogTag::Webserver, LogLevel::Info));
        assert!(!should_log_with(&config, &LogTag::Sampler, LogLevel::Info));
    }
}
