//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "POSGATE_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, for local development.
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `info,posgate_session=debug`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl TracingConfig {
    /// `RUST_LOG` for the filter, `POSGATE_LOG_FORMAT` (`json` | `pretty`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup("RUST_LOG") {
            if !filter.trim().is_empty() {
                config.filter = filter;
            }
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            config.format = match format.trim().to_ascii_lowercase().as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }
        config
    }
}

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &TracingConfig) {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_json_at_info() {
        let config = TracingConfig::from_lookup(|_| None);
        assert_eq!(config, TracingConfig::default());
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn reads_filter_and_format() {
        let config = TracingConfig::from_lookup(|key| match key {
            "RUST_LOG" => Some("debug,posgate_session=trace".to_string()),
            LOG_FORMAT_VAR => Some(" Pretty ".to_string()),
            _ => None,
        });
        assert_eq!(config.filter, "debug,posgate_session=trace");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn blank_filter_and_unknown_format_fall_back() {
        let config = TracingConfig::from_lookup(|key| match key {
            "RUST_LOG" => Some("  ".to_string()),
            LOG_FORMAT_VAR => Some("xml".to_string()),
            _ => None,
        });
        assert_eq!(config, TracingConfig::default());
    }

    #[test]
    fn init_twice_is_a_no_op() {
        let config = TracingConfig {
            filter: "not a [valid filter".to_string(),
            format: LogFormat::Pretty,
        };
        init(&config);
        init(&TracingConfig::default());
    }
}
