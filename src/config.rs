//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `host.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - SensorConfig: GPIO pin, settle delay, retry count.
//!     - PollingConfig: reading interval and the staleness multiplier.
//!     - ServerConfig: bind address and the startup grace period.
//!     - LoggingConfig: log level and per-cycle value logging.
//!
//! ==============================================================================

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// env var naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DHT22_HOST_CONFIG";

/// longest accepted reading interval (one day)
pub const MAX_INTERVAL_SECONDS: u64 = 86_400;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    pub sensor: SensorConfig,
    pub polling: PollingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    pub gpio_pin: u8,
    /// wait between trigger and read
    pub settle_delay_ms: u64,
    /// not consulted: the sampler never retries within a cycle, a failed
    /// cycle just waits for the next one
    #[allow(dead_code)]
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_seconds: u64,
    /// readings older than `stale_multiplier * interval_seconds` report as stale
    pub stale_multiplier: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub startup_grace_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { gpio_pin: 4, settle_delay_ms: 200, max_retries: 3 }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: 60, stale_multiplier: 3 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000, startup_grace_seconds: 3 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl HostConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: HostConfig = toml::from_str(content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// find and load the config file
    ///
    /// `$DHT22_HOST_CONFIG` wins if set. otherwise the first of `config/host.toml`
    /// and `../config/host.toml` that exists is used, and with neither the defaults
    /// apply. a file that exists but doesn't load is an error, not a fallback.
    /// returns the path actually loaded, if any.
    pub fn discover() -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, Some(path)));
        }

        let paths = [
            PathBuf::from("config").join("host.toml"),
            PathBuf::from("..").join("config").join("host.toml"),
        ];
        match paths.into_iter().find(|p| p.exists()) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.polling.interval_seconds == 0 {
            bail!("polling.interval_seconds must be at least 1");
        }
        if self.polling.interval_seconds > MAX_INTERVAL_SECONDS {
            bail!("polling.interval_seconds must be at most {}", MAX_INTERVAL_SECONDS);
        }
        if self.polling.stale_multiplier == 0 {
            bail!("polling.stale_multiplier must be at least 1");
        }
        Ok(())
    }

    pub fn reading_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_seconds)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.sensor.settle_delay_ms)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.server.startup_grace_seconds)
    }

    /// age in seconds past which a reading is stale
    ///
    /// saturates instead of wrapping for configs built without `validate`
    pub fn stale_after_seconds(&self) -> i64 {
        i64::try_from(self.polling.interval_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(i64::from(self.polling.stale_multiplier))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        tracing::info!(
            gpio_pin = self.sensor.gpio_pin,
            interval_s = self.polling.interval_seconds,
            settle_ms = self.sensor.settle_delay_ms,
            stale_after_s = self.stale_after_seconds(),
            bind = %self.bind_addr(),
            log_level = %self.logging.level,
            "host configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HostConfig::default();
        assert_eq!(config.sensor.gpio_pin, 4);
        assert_eq!(config.reading_interval(), Duration::from_secs(60));
        assert_eq!(config.settle_delay(), Duration::from_millis(200));
        assert_eq!(config.startup_grace(), Duration::from_secs(3));
        assert_eq!(config.stale_after_seconds(), 180);
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = HostConfig::parse(
            r#"
            [sensor]
            gpio_pin = 17

            [polling]
            interval_seconds = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.sensor.gpio_pin, 17);
        assert_eq!(config.sensor.settle_delay_ms, 200);
        assert_eq!(config.stale_after_seconds(), 90);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(HostConfig::parse("").unwrap(), HostConfig::default());
    }

    #[test]
    fn zero_interval_rejected() {
        let err = HostConfig::parse("[polling]\ninterval_seconds = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("interval_seconds"));
    }

    #[test]
    fn oversized_interval_rejected() {
        let err = HostConfig::parse("[polling]\ninterval_seconds = 86401\n").unwrap_err();
        assert!(format!("{:#}", err).contains("at most 86400"));

        let max = HostConfig::parse("[polling]\ninterval_seconds = 86400\nstale_multiplier = 4294967295\n").unwrap();
        assert_eq!(max.stale_after_seconds(), 86_400 * 4_294_967_295);
    }

    #[test]
    fn stale_limit_never_wraps_negative() {
        let mut config = HostConfig::default();
        config.polling.interval_seconds = u64::MAX;
        assert_eq!(config.stale_after_seconds(), i64::MAX);

        config.polling.interval_seconds = i64::MAX as u64;
        config.polling.stale_multiplier = 3;
        assert_eq!(config.stale_after_seconds(), i64::MAX);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = HostConfig::load("does/not/exist.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("does/not/exist.toml"));
    }
}
