/// Define a configuration struct with embedded defaults
///
/// Each field is declared with its type and default value in one place.
/// The macro generates the struct with public fields, `PartialEq`, a
/// `Default` impl built from those values, and serde support with
/// `#[serde(default)]` so a partial TOML section only overrides the keys
/// it names.
///
/// # Example
///
/// The `[sampler]` section as declared in `schemas.rs`:
///
/// ```
/// metricsdash::config_struct! {
///     /// Built-in CPU / memory sampler
///     pub struct SamplerConfig {
///         enabled: bool = true,
///         interval_ms: u64 = 2000,
///     }
/// }
///
/// let sampler: SamplerConfig = toml::from_str("interval_ms = 500").unwrap();
/// assert!(sampler.enabled);
/// assert_eq!(sampler.interval_ms, 500);
/// assert_ne!(sampler, SamplerConfig::default());
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
