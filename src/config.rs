use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    audio::types::EngineConfig,
    error::{ConfigError, Result},
};

/// Main configuration for the Pulse-Analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analysis engine tunables
    #[serde(default)]
    pub engine: EngineConfig,

    /// Polling host settings
    #[serde(default)]
    pub host: HostConfig,

    /// Readout formatting
    #[serde(default)]
    pub readout: ReadoutConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| ConfigError::InvalidValue { key: "engine".to_string(), value: e })?;
        self.host.validate()?;
        Ok(())
    }
}

/// Polling host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Interval between analysis steps in milliseconds
    pub poll_interval_ms: u64,

    /// FFT size used by file-backed sources
    pub fft_size: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            fft_size: 2048,
        }
    }
}

impl HostConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "host.poll_interval_ms".to_string(),
                value: self.poll_interval_ms.to_string()
            }.into());
        }

        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::InvalidValue {
                key: "host.fft_size".to_string(),
                value: self.fft_size.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Which values the readout shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    pub show_bpm: bool,
    pub show_volume: bool,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            show_bpm: true,
            show_volume: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.engine.smoothing_factor = 0.8;
        original_config.readout.show_volume = false;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[engine]\nmin_bpm = 60.0\n\n[host]\npoll_interval_ms = 50\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.engine.min_bpm, 60.0);
        assert_eq!(config.engine.max_bpm, 220.0);
        assert_eq!(config.host.poll_interval(), Duration::from_millis(50));
        assert!(config.readout.show_bpm);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(crate::error::PulseError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_engine_values_rejected_on_load() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "[engine]\nmin_bpm = 150.0\nmax_bpm = 100.0\n").unwrap();

        assert!(Config::from_file(&file_path).is_err());
    }

    #[test]
    fn test_invalid_host_config() {
        let mut config = Config::default();
        config.host.fft_size = 1000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.host.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
