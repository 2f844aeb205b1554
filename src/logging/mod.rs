//! Tracing setup for the harness
//!
//! Builds an `EnvFilter` from [`LoggingConfig`] and installs a pretty or JSON
//! formatter. `RUST_LOG`, when set, replaces the configured filter.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build filter directives string from LoggingConfig
///
/// The base level comes first, followed by one `conformance::<component>=<level>`
/// directive per configured component, sorted by component name.
///
/// # Examples
///
/// ```
/// use conformance::config::{LogFormat, LoggingConfig};
/// use conformance::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("sse".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     log_frames: false,
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,conformance::sse=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",conformance::{}={}", component, level));
        }
    }

    filter_str
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter_str = build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.log_frames {
        eprintln!("WARNING: Frame logging is enabled. Raw model output will be logged at debug level.");
    }

    // Logs go to stderr so stdout stays clean for --json reports
    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .pretty(),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .json(),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_base_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_directives_sorted_components() {
        let mut levels = HashMap::new();
        levels.insert("validate".to_string(), "trace".to_string());
        levels.insert("client".to_string(), "debug".to_string());
        let config = LoggingConfig {
            level: "warn".to_string(),
            component_levels: Some(levels),
            ..LoggingConfig::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "warn,conformance::client=debug,conformance::validate=trace"
        );
    }
}
