//! Configuration for the NeuroFocus Agent.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default time between sampling ticks.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Default smoothing window size, in samples (~4s at the default interval).
pub const DEFAULT_SMOOTH_WINDOW: usize = 8;

/// Default threshold at or above which the smoothed value reads as relaxed.
pub const DEFAULT_THRESH_HIGH: u16 = 70;

/// Default threshold at or above which the smoothed value reads as mild.
pub const DEFAULT_THRESH_MED: u16 = 40;

/// Smallest accepted smoothing window.
pub const MIN_SMOOTH_WINDOW: usize = 1;

/// Largest accepted smoothing window.
pub const MAX_SMOOTH_WINDOW: usize = 30;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time between sampling ticks
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,

    /// Smoothing window size in samples
    pub smooth_window: usize,

    /// Smoothed values at or above this read as relaxed
    pub thresh_high: u16,

    /// Smoothed values at or above this (and below `thresh_high`) read as mild
    pub thresh_med: u16,

    /// Run against the simulated generator instead of hardware
    pub demo_mode: bool,

    /// Explicit serial port; discovered automatically when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            smooth_window: DEFAULT_SMOOTH_WINDOW,
            thresh_high: DEFAULT_THRESH_HIGH,
            thresh_med: DEFAULT_THRESH_MED,
            demo_mode: false,
            port: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file is not an error; defaults are returned.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neurofocus-agent")
            .join("config.json")
    }

    /// Check the invariants the rest of the pipeline relies on.
    ///
    /// `thresh_med < thresh_high` is enforced here, once, rather than on
    /// every tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sample interval must be greater than zero".to_string(),
            ));
        }
        if self.smooth_window < MIN_SMOOTH_WINDOW || self.smooth_window > MAX_SMOOTH_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "smoothing window must be between {MIN_SMOOTH_WINDOW} and {MAX_SMOOTH_WINDOW} samples, got {}",
                self.smooth_window
            )));
        }
        if self.thresh_high > 100 {
            return Err(ConfigError::Invalid(format!(
                "relaxed threshold cannot exceed 100, got {}",
                self.thresh_high
            )));
        }
        if self.thresh_med >= self.thresh_high {
            return Err(ConfigError::Invalid(format!(
                "mild threshold ({}) must be below the relaxed threshold ({})",
                self.thresh_med, self.thresh_high
            )));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as fractional seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        // from_secs_f64 panics on input a Duration cannot hold; the
        // fallible variant turns that into a parse error.
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom("interval must be a non-negative number of seconds in range")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.sample_interval, Duration::from_millis(500));
        assert_eq!(config.smooth_window, 8);
        assert_eq!(config.thresh_high, 70);
        assert_eq!(config.thresh_med, 40);
        assert!(!config.demo_mode);
        assert!(config.port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let inverted = Config {
            thresh_high: 40,
            thresh_med: 70,
            ..Config::default()
        };
        assert!(inverted.validate().is_err());

        let equal = Config {
            thresh_high: 50,
            thresh_med: 50,
            ..Config::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_window_sizes() {
        let zero = Config {
            smooth_window: 0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());

        let huge = Config {
            smooth_window: 31,
            ..Config::default()
        };
        assert!(huge.validate().is_err());

        let edge = Config {
            smooth_window: 30,
            ..Config::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            sample_interval: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_above_scale() {
        let config = Config {
            thresh_high: 101,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_serializes_as_fractional_seconds() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"sample_interval\":0.5"));

        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sample_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_negative_interval_rejected_at_parse() {
        let json = r#"{"sample_interval":-1.0,"smooth_window":8,"thresh_high":70,"thresh_med":40,"demo_mode":false}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn test_oversized_interval_rejected_at_parse() {
        // Larger than any Duration can hold; must come back as Err, not
        // abort the process.
        let json = r#"{"sample_interval":1.0e20,"smooth_window":8,"thresh_high":70,"thresh_med":40,"demo_mode":false}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }
}
