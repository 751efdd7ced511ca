//! `log` facade bridge
//!
//! Dependencies such as hyper/axum log through the `log` facade; this
//! routes those records through our formatter so output stays uniform.

use super::levels::LogLevel;
use super::tags::LogTag;

struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        super::core::should_log(&LogTag::External, LogLevel::from_log_level(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}: {}", record.target(), record.args());
        super::core::log_internal(
            LogTag::External,
            LogLevel::from_log_level(record.level()),
            &message,
        );
    }

    fn flush(&self) {}
}

/// Install the bridge as the global `log` logger (first call wins)
pub fn install() {
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}
