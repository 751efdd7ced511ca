//! Structured, tag-based logging for metricsdash
//!
//! ## Usage
//!
//! ```rust
//! use metricsdash::logger::{self, LogTag};
//!
//! logger::error(LogTag::Webserver, "Failed to bind listener");
//! logger::warning(LogTag::Dashboard, "Subscriber queue full");
//! logger::info(LogTag::System, "Dashboard started");
//! logger::debug(LogTag::Dashboard, "Flush cycle: ..."); // Only with --debug-dashboard
//! logger::verbose(LogTag::Sampler, "Raw sample: ..."); // Only with --verbose
//! ```
//!
//! Call [`init`] once at startup, after the command-line arguments have
//! been parsed. Records emitted through the `log` facade by third-party
//! crates are routed through the same formatter under [`LogTag::External`].

mod bridge;
mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Reads debug flags from the parsed arguments and installs the `log`
/// facade bridge. Safe to call more than once; only the first bridge
/// installation takes effect.
pub fn init() {
    config::init_from_args();
    bridge::install();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the `--debug-<tag>` flag for this tag was provided.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}
