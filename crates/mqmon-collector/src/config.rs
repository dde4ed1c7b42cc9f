//! Collector configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the collector and its reporting backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Name of the queue manager being monitored. Required.
    #[serde(default)]
    pub qmgr_name: String,

    /// Seconds between collection cycles.
    #[serde(default = "default_collect_interval_secs")]
    pub collect_interval_secs: u64,

    /// Minimum seconds between status polls. Status is polled on the first
    /// cycle whose start lies at least this long after the previous poll.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Channels to poll status for: comma-separated names, `*` wildcards.
    #[serde(default = "default_monitored")]
    pub monitored_channels: String,

    /// Queues to poll status for.
    #[serde(default = "default_monitored")]
    pub monitored_queues: String,

    /// Whether queue status is polled at all.
    #[serde(default)]
    pub queue_status: bool,

    /// Reporting backend: "log", "file", "http" or "none".
    #[serde(default = "default_reporter_type")]
    pub reporter_type: String,

    /// Path for the file backend (JSON lines, one report per line).
    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// Endpoint for the http backend.
    #[serde(default)]
    pub http_endpoint: String,

    /// TCP port the Prometheus endpoint listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// HTTP path the gauges are served under.
    #[serde(default = "default_metric_path")]
    pub http_metric_path: String,

    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_collect_interval_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_monitored() -> String {
    "*".to_string()
}

fn default_reporter_type() -> String {
    "log".to_string()
}

fn default_export_path() -> String {
    "./mqmon-reports.jsonl".to_string()
}

fn default_listen_port() -> u16 {
    9157
}

fn default_metric_path() -> String {
    "/metrics".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            qmgr_name: String::new(),
            collect_interval_secs: default_collect_interval_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            monitored_channels: default_monitored(),
            monitored_queues: default_monitored(),
            queue_status: false,
            reporter_type: default_reporter_type(),
            export_path: default_export_path(),
            http_endpoint: String::new(),
            listen_port: default_listen_port(),
            http_metric_path: default_metric_path(),
            log_level: default_log_level(),
        }
    }
}

impl CollectorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.qmgr_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "qmgr_name must be set".to_string(),
            ));
        }
        if self.collect_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "collect_interval_secs must be at least 1".to_string(),
            ));
        }
        if !self.http_metric_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "http_metric_path must start with '/'".to_string(),
            ));
        }
        match self.reporter_type.as_str() {
            "log" | "file" | "none" => {}
            "http" => {
                if self.http_endpoint.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "http_endpoint must be set when reporter_type is \"http\"".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown reporter_type {other:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(self.collect_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Default configuration rendered as TOML, for `--dump-default-config`.
    pub fn render_default() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CollectorConfig::default();
        assert_eq!(config.collect_interval_secs, 10);
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.monitored_channels, "*");
        assert_eq!(config.monitored_queues, "*");
        assert!(!config.queue_status);
        assert_eq!(config.reporter_type, "log");
        assert_eq!(config.listen_port, 9157);
        assert_eq!(config.http_metric_path, "/metrics");
    }

    #[test]
    fn test_parse_with_partial_fields() {
        let config: CollectorConfig = toml::from_str(
            r#"
            qmgr_name = "QM1"
            poll_interval_secs = 60
            queue_status = true
            "#,
        )
        .unwrap();
        assert_eq!(config.qmgr_name, "QM1");
        assert_eq!(config.poll_interval_secs, 60);
        assert!(config.queue_status);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.reporter_type, "log");
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_requires_qmgr_name() {
        let config = CollectorConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_http_requires_endpoint() {
        let config = CollectorConfig {
            qmgr_name: "QM1".into(),
            reporter_type: "http".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CollectorConfig {
            http_endpoint: "http://collector.example.com/reports".into(),
            ..config
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_reporter() {
        let config = CollectorConfig {
            qmgr_name: "QM1".into(),
            reporter_type: "carrier-pigeon".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_metric_path() {
        let config = CollectorConfig {
            qmgr_name: "QM1".into(),
            http_metric_path: "metrics".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_render_default_is_parseable() {
        let rendered = CollectorConfig::render_default();
        let back: CollectorConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(back.poll_interval_secs, 30);
    }
}
