/// Configuration system
///
/// - `macros`: `config_struct!` for single-declaration structs with defaults
/// - `schemas`: every configuration section
/// - `utils`: loading from TOML and global access
mod macros;
mod schemas;
mod utils;

pub use schemas::{Config, DashboardConfig, SamplerConfig, WebserverConfig};
pub use utils::{
    apply_overrides, get_config_clone, load_config_from_path, parse_config,
    with_config, CONFIG_FILE_PATH,
};
