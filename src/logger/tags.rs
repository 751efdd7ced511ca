/// Log tags identify the subsystem a message comes from
///
/// Each tag has a debug key; `--debug-<key>` enables DEBUG output for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Dashboard,
    Webserver,
    Sampler,
    Services,
    /// Records forwarded from the `log` facade
    External,
}

impl LogTag {
    pub const ALL: [LogTag; 7] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Dashboard,
        LogTag::Webserver,
        LogTag::Sampler,
        LogTag::Services,
        LogTag::External,
    ];

    /// Key used by `--debug-<key>` flags and tag filters
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Dashboard => "dashboard",
            LogTag::Webserver => "webserver",
            LogTag::Sampler => "sampler",
            LogTag::Services => "services",
            LogTag::External => "external",
        }
        .to_string()
    }

    /// Uncolored label used in the log prefix
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Dashboard => "DASHBOARD",
            LogTag::Webserver => "WEBSERVER",
            LogTag::Sampler => "SAMPLER",
            LogTag::Services => "SERVICES",
            LogTag::External => "EXTERNAL",
        }
    }
}
