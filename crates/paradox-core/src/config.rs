//! Configuration loading and typed config structures for a Paradox match.
//!
//! The canonical configuration lives in `paradox-config.yaml` at the
//! project root. Every field has a default, so an empty document (or no
//! file at all) yields a playable two-player, two-universe match.

use std::path::Path;

use serde::{Deserialize, Serialize};

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

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level match configuration.
///
/// Mirrors the structure of `paradox-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Player count, universe count, and win threshold.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Horizon and time-window lengths.
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Growth and transit constants.
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Relaxation limits.
    #[serde(default)]
    pub relaxation: RelaxationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatchConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.player_count == 0 {
            return Err(invalid("rules.player_count", "must be at least 1"));
        }
        if self.rules.universe_count == 0 {
            return Err(invalid("rules.universe_count", "must be at least 1"));
        }
        if self.rules.flags_to_win == 0 {
            return Err(invalid("rules.flags_to_win", "must be at least 1"));
        }
        positive("timeline.horizon", self.timeline.horizon)?;
        positive(
            "timeline.wormhole_open_duration",
            self.timeline.wormhole_open_duration,
        )?;
        non_negative("timeline.command_cooldown", self.timeline.command_cooldown)?;
        non_negative("physics.growth_per_size", self.physics.growth_per_size)?;
        positive("physics.flight_speed", self.physics.flight_speed)?;
        if self.relaxation.max_rounds == 0 {
            return Err(invalid("relaxation.max_rounds", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite and non-negative, got {value}")))
    }
}

/// Match rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Number of players.
    #[serde(default = "default_player_count")]
    pub player_count: u32,

    /// Number of parallel universes.
    #[serde(default = "default_universe_count")]
    pub universe_count: u32,

    /// Flags a player needs to win.
    #[serde(default = "default_flags_to_win")]
    pub flags_to_win: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            player_count: default_player_count(),
            universe_count: default_universe_count(),
            flags_to_win: default_flags_to_win(),
        }
    }
}

/// Timeline lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Length of every universe's history. Flights ending after this are
    /// dropped.
    #[serde(default = "default_horizon")]
    pub horizon: f64,

    /// How long each wormhole window stays open.
    #[serde(default = "default_wormhole_open_duration")]
    pub wormhole_open_duration: f64,

    /// Half-width of the window around a command in which the same player
    /// cannot command the same planet again.
    #[serde(default = "default_command_cooldown")]
    pub command_cooldown: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            wormhole_open_duration: default_wormhole_open_duration(),
            command_cooldown: default_command_cooldown(),
        }
    }
}

/// Growth and transit constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Ships grown per time unit per unit of planet size, on owned planets.
    #[serde(default = "default_growth_per_size")]
    pub growth_per_size: f64,

    /// Distance flights cover per time unit.
    #[serde(default = "default_flight_speed")]
    pub flight_speed: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            growth_per_size: default_growth_per_size(),
            flight_speed: default_flight_speed(),
        }
    }
}

/// Relaxation limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaxationConfig {
    /// Rounds after which a relaxation that has not settled is abandoned.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_player_count() -> u32 {
    2
}

const fn default_universe_count() -> u32 {
    2
}

const fn default_flags_to_win() -> u32 {
    25
}

const fn default_horizon() -> f64 {
    100.0
}

const fn default_wormhole_open_duration() -> f64 {
    5.0
}

const fn default_command_cooldown() -> f64 {
    5.0
}

const fn default_growth_per_size() -> f64 {
    1.2
}

const fn default_flight_speed() -> f64 {
    0.55
}

const fn default_max_rounds() -> u32 {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}
