//! Configuration management
//!
//! All settings come from command-line flags with environment-variable
//! fallbacks (the deployment sets env vars; flags exist for local runs).
//! Configuration is read once at startup and is immutable afterwards;
//! changing a threshold requires a restart.

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Which alert kinds maintenance mode suppresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaintenanceScope {
    /// Suppress every alert kind during maintenance
    All,
    /// Suppress only failover alerts during maintenance
    Failover,
}

/// Runtime configuration for the pool watcher
#[derive(Parser, Debug, Clone)]
#[command(
    name = "poolwatch",
    about = "Access-log watcher that alerts on pool failover and error-rate spikes",
    long_about = "Tails a JSON-formatted HTTP access log from a blue/green deployment and \
                  sends Slack alerts when traffic fails over between pools or when the \
                  rolling 5xx error rate exceeds a threshold."
)]
pub struct Config {
    /// Access log file to follow
    #[arg(
        long,
        value_name = "FILE",
        env = "LOG_FILE",
        default_value = "/var/log/nginx/access.log"
    )]
    pub log_file: PathBuf,

    /// Slack incoming-webhook URL for alert delivery
    #[arg(long, value_name = "URL", env = "SLACK_WEBHOOK_URL")]
    pub slack_webhook_url: String,

    /// Error-rate threshold in percent; alerts fire strictly above this
    #[arg(
        long,
        env = "ERROR_RATE_THRESHOLD",
        default_value_t = 2.0,
        allow_negative_numbers = true
    )]
    pub error_rate_threshold: f64,

    /// Number of recent requests in the sliding window
    #[arg(long, env = "WINDOW_SIZE", default_value_t = 200)]
    pub window_size: usize,

    /// Minimum seconds between two alerts of the same kind
    #[arg(long, env = "ALERT_COOLDOWN_SEC", default_value_t = 300)]
    pub alert_cooldown_sec: u64,

    /// Suppress alerts during planned maintenance
    #[arg(long, env = "MAINTENANCE_MODE")]
    pub maintenance_mode: bool,

    /// Which alert kinds maintenance mode suppresses
    #[arg(long, env = "MAINTENANCE_SCOPE", value_enum, default_value = "all")]
    pub maintenance_scope: MaintenanceScope,

    /// Evaluate the error rate every Nth event once the window is full
    #[arg(long, env = "ERROR_CHECK_INTERVAL", default_value_t = 1)]
    pub check_interval: u32,

    /// Pool expected to serve traffic under normal conditions
    #[arg(long, env = "EXPECTED_PRIMARY_POOL", default_value = "blue")]
    pub primary_pool: String,

    /// Pool expected to take over when the primary fails
    #[arg(long, env = "EXPECTED_BACKUP_POOL", default_value = "green")]
    pub backup_pool: String,

    /// Enable verbose logging output (sets RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration at startup
    ///
    /// Invalid configuration is fatal: the watcher assumes valid settings
    /// during steady-state processing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slack_webhook_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "slack webhook URL must not be empty".to_string(),
            ));
        }
        if self.window_size < 1 {
            return Err(ConfigError::ValidationError(
                "window size must be at least 1".to_string(),
            ));
        }
        if self.check_interval < 1 {
            return Err(ConfigError::ValidationError(
                "check interval must be at least 1".to_string(),
            ));
        }
        if !self.error_rate_threshold.is_finite() || self.error_rate_threshold < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "error rate threshold must be a non-negative percentage, got {}",
                self.error_rate_threshold
            )));
        }
        if self.primary_pool.is_empty() || self.backup_pool.is_empty() {
            return Err(ConfigError::ValidationError(
                "pool names must not be empty".to_string(),
            ));
        }
        if self.primary_pool == self.backup_pool {
            return Err(ConfigError::ValidationError(format!(
                "primary and backup pool must differ, both are '{}'",
                self.primary_pool
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut full = vec!["poolwatch", "--slack-webhook-url", "https://hooks.example/T/X"];
        full.extend_from_slice(args);
        Config::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.window_size, 200);
        assert_eq!(config.error_rate_threshold, 2.0);
        assert_eq!(config.alert_cooldown_sec, 300);
        assert_eq!(config.check_interval, 1);
        assert_eq!(config.primary_pool, "blue");
        assert_eq!(config.backup_pool, "green");
        assert_eq!(config.maintenance_scope, MaintenanceScope::All);
        assert!(!config.maintenance_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_maintenance_scope_values() {
        let config = parse(&["--maintenance-scope", "failover"]);
        assert_eq!(config.maintenance_scope, MaintenanceScope::Failover);
    }

    #[test]
    fn test_rejects_zero_window() {
        let config = parse(&["--window-size", "0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_check_interval() {
        let config = parse(&["--check-interval", "0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = parse(&["--error-rate-threshold", "-1.0"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_identical_pools() {
        let config = parse(&["--primary-pool", "blue", "--backup-pool", "blue"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_webhook() {
        let config = Config::try_parse_from(["poolwatch", "--slack-webhook-url", " "]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_pools() {
        let config = parse(&["--primary-pool", "east", "--backup-pool", "west"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.primary_pool, "east");
        assert_eq!(config.backup_pool, "west");
    }
}
