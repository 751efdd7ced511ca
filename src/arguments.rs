/// Command-line argument handling
///
/// Arguments are parsed once by the binary and stored globally so any
/// module can check debug flags without threading them through.
use clap::Parser;
use once_cell::sync::OnceCell;

use crate::logger::LogTag;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "metricsdash", about = "Real-time application metrics dashboard")]
pub struct Arguments {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override the listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Show VERBOSE output (implies debug output for every tag)
    #[arg(long)]
    pub verbose: bool,

    /// Only show errors
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    #[arg(long)]
    pub debug_system: bool,

    #[arg(long)]
    pub debug_config: bool,

    /// Aggregation, flush cycles and fan-out
    #[arg(long)]
    pub debug_dashboard: bool,

    #[arg(long)]
    pub debug_webserver: bool,

    #[arg(long)]
    pub debug_sampler: bool,

    #[arg(long)]
    pub debug_services: bool,

    #[arg(long)]
    pub debug_external: bool,
}

static ARGUMENTS: OnceCell<Arguments> = OnceCell::new();

/// Store parsed arguments (first call wins)
pub fn set_arguments(args: Arguments) {
    let _ = ARGUMENTS.set(args);
}

/// Get the stored arguments, or defaults when none were set (tests, embedding)
pub fn get_arguments() -> Arguments {
    ARGUMENTS.get().cloned().unwrap_or_default()
}

/// Check the `--debug-<tag>` flag for a log tag
pub fn is_debug_enabled_for(tag: LogTag) -> bool {
    let args = match ARGUMENTS.get() {
        Some(args) => args,
        None => return false,
    };
    match tag {
        LogTag::System => args.debug_system,
        LogTag::Config => args.debug_config,
        LogTag::Dashboard => args.debug_dashboard,
        LogTag::Webserver => args.debug_webserver,
        LogTag::Sampler => args.debug_sampler,
        LogTag::Services => args.debug_services,
        LogTag::External => args.debug_external,
    }
}

/// Webserver debug mode
pub fn is_debug_webserver_enabled() -> bool {
    is_debug_enabled_for(LogTag::Webserver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_debug_flags() {
        let args =
            Arguments::try_parse_from(["metricsdash", "--debug-dashboard", "--port", "9090"])
                .unwrap();
        assert!(args.debug_dashboard);
        assert!(!args.debug_webserver);
        assert_eq!(args.port, Some(9090));
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Arguments::try_parse_from(["metricsdash", "--quiet", "--verbose"]).is_err());
    }
}
