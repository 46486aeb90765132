//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// HTTP target settings
    #[serde(default)]
    pub target: TargetConfig,

    /// Test data roots
    #[serde(default)]
    pub data: DataConfig,

    /// Scheduling settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Default polling policy for `eventually` steps
    #[serde(default)]
    pub eventually: EventuallyConfig,
}

/// HTTP target settings
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    /// Base URL requests are sent to (e.g. `http://localhost:8080`)
    #[serde(default = "default_host")]
    pub host: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Test data roots, each becomes one top-level suite
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DataConfig {
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// Scheduling settings
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Maximum number of leaves executing at once (one per data root)
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

fn default_parallelism() -> usize {
    1
}

/// Polling defaults in milliseconds
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct EventuallyConfig {
    /// Overall wait when a step does not declare a timeout
    #[serde(default = "default_eventually_timeout")]
    pub timeout_ms: u64,

    /// Sleep between attempts when a step does not declare an interval
    #[serde(default = "default_eventually_interval")]
    pub interval_ms: u64,
}

impl Default for EventuallyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_eventually_timeout(),
            interval_ms: default_eventually_interval(),
        }
    }
}

fn default_eventually_timeout() -> u64 {
    1_000
}
fn default_eventually_interval() -> u64 {
    100
}

impl EventuallyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.runner.parallelism == 0 {
            return Err(super::Error::Config(
                "runner.parallelism must be at least 1".to_string(),
            ));
        }
        if self.eventually.interval_ms == 0 {
            return Err(super::Error::Config(
                "eventually.interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.target.host, "http://localhost:8080");
        assert_eq!(config.runner.parallelism, 1);
        assert_eq!(config.eventually.timeout(), Duration::from_secs(1));
        assert_eq!(config.eventually.interval(), Duration::from_millis(100));
        assert!(config.data.dirs.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
[target]
host = "http://api.local:9000"

[data]
dirs = ["tests/data", "tests/more"]

[eventually]
timeout_ms = 5000
"#,
        )
        .unwrap();
        assert_eq!(config.target.host, "http://api.local:9000");
        assert_eq!(config.target.request_timeout_secs, 30);
        assert_eq!(config.data.dirs.len(), 2);
        assert_eq!(config.eventually.timeout_ms, 5000);
        assert_eq!(config.eventually.interval_ms, 100);
    }

    #[test]
    fn test_rejects_zero_parallelism() {
        let err = Config::parse("[runner]\nparallelism = 0\n").unwrap_err();
        assert!(matches!(err, crate::common::Error::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Config::parse("[runner\n").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }
}
