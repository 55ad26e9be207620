//! Configuration loading and typed config structures for the trainer.
//!
//! The canonical configuration lives in `pileup.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the
//! YAML structure and provides a loader that reads and validates the
//! file. Configuration is read once at startup and treated as immutable
//! for the process lifetime.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds contradictory values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level trainer configuration.
///
/// Mirrors the structure of `pileup.yaml`. All fields have defaults,
/// so a missing or partial file still yields a usable trainer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrainerConfig {
    /// The operator's own station identity and sending speed.
    #[serde(default)]
    pub station: StationConfig,

    /// Audio rendering parameters.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Simulated caller pool parameters.
    #[serde(default)]
    pub callers: CallerPoolConfig,

    /// Round lifecycle timing.
    #[serde(default)]
    pub round: RoundConfig,
}

impl TrainerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are contradictory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML,
    /// or [`ConfigError::Invalid`] if the values are contradictory.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.callers.max_callers == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("callers.max_callers must be at least 1"),
            });
        }
        if self.callers.min_speed_wpm == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("callers.min_speed_wpm must be at least 1"),
            });
        }
        if self.callers.min_speed_wpm > self.callers.max_speed_wpm {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "callers.min_speed_wpm ({}) exceeds max_speed_wpm ({})",
                    self.callers.min_speed_wpm, self.callers.max_speed_wpm
                ),
            });
        }
        if self.station.speed_wpm == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("station.speed_wpm must be at least 1"),
            });
        }
        if self.round.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("round.poll_interval_ms must be at least 1"),
            });
        }
        // The grace period must exceed one poll interval, otherwise a
        // caller can miss the DIE event and leak into the next round.
        if self.round.die_grace_ms <= self.round.poll_interval_ms {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "round.die_grace_ms ({}) must exceed round.poll_interval_ms ({})",
                    self.round.die_grace_ms, self.round.poll_interval_ms
                ),
            });
        }
        Ok(())
    }
}

/// The operator's own station settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StationConfig {
    /// The operator's callsign, sent in CQ calls.
    #[serde(default = "default_callsign")]
    pub callsign: String,

    /// The operator's Field Day class.
    #[serde(default = "default_class")]
    pub class: String,

    /// The operator's ARRL section.
    #[serde(default = "default_section")]
    pub section: String,

    /// The operator's sending speed in words per minute.
    #[serde(default = "default_station_speed")]
    pub speed_wpm: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            callsign: default_callsign(),
            class: default_class(),
            section: default_section(),
            speed_wpm: default_station_speed(),
        }
    }
}

/// Audio rendering settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioConfig {
    /// Center side tone in hertz. Caller pitches spread around this.
    #[serde(default = "default_side_tone_hz")]
    pub side_tone_hz: u32,

    /// Total pitch bandwidth in hertz the caller pool may occupy.
    #[serde(default = "default_bandwidth_hz")]
    pub bandwidth_hz: u32,

    /// Rendered volume in the 0.0--1.0 range.
    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            side_tone_hz: default_side_tone_hz(),
            bandwidth_hz: default_bandwidth_hz(),
            volume: default_volume(),
        }
    }
}

/// Simulated caller pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallerPoolConfig {
    /// Upper bound on concurrent callers per round (further capped by
    /// available hardware parallelism).
    #[serde(default = "default_max_callers")]
    pub max_callers: u32,

    /// Slowest caller sending speed in words per minute.
    #[serde(default = "default_min_speed")]
    pub min_speed_wpm: u32,

    /// Fastest caller sending speed in words per minute.
    #[serde(default = "default_max_speed")]
    pub max_speed_wpm: u32,
}

impl Default for CallerPoolConfig {
    fn default() -> Self {
        Self {
            max_callers: default_max_callers(),
            min_speed_wpm: default_min_speed(),
            max_speed_wpm: default_max_speed(),
        }
    }
}

/// Round lifecycle timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoundConfig {
    /// Caller polling cadence in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long to wait for callers to observe DIE and exit before
    /// aborting them. Must exceed `poll_interval_ms`.
    #[serde(default = "default_die_grace_ms")]
    pub die_grace_ms: u64,

    /// Seconds of operator idleness before CQ is reissued automatically.
    /// Zero disables the auto-CQ timer.
    #[serde(default = "default_auto_cq_secs")]
    pub auto_cq_secs: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            die_grace_ms: default_die_grace_ms(),
            auto_cq_secs: default_auto_cq_secs(),
        }
    }
}

fn default_callsign() -> String {
    String::from("N0CALL")
}

fn default_class() -> String {
    String::from("1D")
}

fn default_section() -> String {
    String::from("MDC")
}

const fn default_station_speed() -> u32 {
    30
}

const fn default_side_tone_hz() -> u32 {
    650
}

const fn default_bandwidth_hz() -> u32 {
    300
}

const fn default_volume() -> f32 {
    0.3
}

const fn default_max_callers() -> u32 {
    3
}

const fn default_min_speed() -> u32 {
    10
}

const fn default_max_speed() -> u32 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    100
}

const fn default_die_grace_ms() -> u64 {
    500
}

const fn default_auto_cq_secs() -> u64 {
    15
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_are_valid() {
        let config = TrainerConfig::default();
        assert_eq!(config.audio.side_tone_hz, 650);
        assert_eq!(config.audio.bandwidth_hz, 300);
        assert_eq!(config.callers.max_callers, 3);
        assert_eq!(config.callers.min_speed_wpm, 10);
        assert_eq!(config.callers.max_speed_wpm, 30);
        assert_eq!(config.station.speed_wpm, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = r"
station:
  callsign: W1AW
  section: CT
callers:
  max_callers: 5
";
        let config = TrainerConfig::parse(yaml).unwrap();
        assert_eq!(config.station.callsign, "W1AW");
        assert_eq!(config.station.section, "CT");
        assert_eq!(config.station.class, "1D");
        assert_eq!(config.callers.max_callers, 5);
        assert_eq!(config.callers.min_speed_wpm, 10);
        assert_eq!(config.round.poll_interval_ms, 100);
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config = TrainerConfig::parse("{}").unwrap();
        assert_eq!(config, TrainerConfig::default());
    }

    #[test]
    fn rejects_inverted_speed_range() {
        let yaml = r"
callers:
  min_speed_wpm: 30
  max_speed_wpm: 10
";
        let result = TrainerConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_zero_callers() {
        let yaml = r"
callers:
  max_callers: 0
";
        assert!(TrainerConfig::parse(yaml).is_err());
    }

    #[test]
    fn rejects_grace_not_exceeding_poll_interval() {
        let yaml = r"
round:
  poll_interval_ms: 100
  die_grace_ms: 100
";
        let result = TrainerConfig::parse(yaml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = TrainerConfig::parse("station: [not, a, map]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = TrainerConfig::from_file(Path::new("/nonexistent/pileup.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
