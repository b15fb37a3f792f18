//! Telemetry settings read from `SWARM_*` environment variables.

use std::env;

const DEFAULT_SERVICE_NAME: &str = "snode-swarm";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_METRICS_PORT: u16 = 9100;

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Name attached to the startup log line
    pub service_name: String,

    /// `EnvFilter` directive, e.g. `info` or `swarm_client=debug`
    pub log_level: String,

    /// Install the fmt layer at all
    pub console_output: bool,

    /// Emit one JSON object per line instead of pretty text
    pub json_logs: bool,

    /// Port a scraper would use; reported, not served
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

impl TelemetryConfig {
    /// Read settings from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SWARM_SERVICE_NAME` | `snode-swarm` |
    /// | `SWARM_LOG_LEVEL`, then `RUST_LOG` | `info` |
    /// | `SWARM_CONSOLE_OUTPUT` | `true` |
    /// | `SWARM_JSON_LOGS` | `false` |
    /// | `SWARM_METRICS_PORT` | `9100` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };

        Self {
            service_name: lookup("SWARM_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("SWARM_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            console_output: flag("SWARM_CONSOLE_OUTPUT", defaults.console_output),
            json_logs: flag("SWARM_JSON_LOGS", defaults.json_logs),
            metrics_port: lookup("SWARM_METRICS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),
        }
    }

    /// Override the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_is_default() {
        assert_eq!(TelemetryConfig::from_lookup(lookup(&[])), TelemetryConfig::default());
    }

    #[test]
    fn test_swarm_log_level_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            ("SWARM_LOG_LEVEL", "swarm_client=debug"),
        ]));
        assert_eq!(config.log_level, "swarm_client=debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_flags_and_port() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("SWARM_JSON_LOGS", "Yes"),
            ("SWARM_CONSOLE_OUTPUT", "0"),
            ("SWARM_METRICS_PORT", "9200"),
        ]));
        assert!(config.json_logs);
        assert!(!config.console_output);
        assert_eq!(config.metrics_port, 9200);
    }

    #[test]
    fn test_garbage_falls_back() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("SWARM_JSON_LOGS", "maybe"),
            ("SWARM_METRICS_PORT", "not-a-port"),
        ]));
        assert!(!config.json_logs);
        assert_eq!(config.metrics_port, 9100);
    }

    #[test]
    fn test_with_log_level() {
        let config = TelemetryConfig::default().with_log_level("debug");
        assert_eq!(config.log_level, "debug");
    }
}
