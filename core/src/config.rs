//! Runtime configuration.
//!
//! Loaded from a TOML file (default: `<config_dir>/hitball/config.toml`).
//! A missing file is not an error; every knob has a built-in default
//! matching the bot's historical behavior.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Location of the durable counter snapshot.
    pub data_file: PathBuf,

    /// Cooldown between hit actions by one actor, in milliseconds.
    pub hit_cooldown_ms: u64,

    /// Cooldown between query/command actions by one actor, in milliseconds.
    pub command_cooldown_ms: u64,

    /// Violations inside one reset window before the caller should apply a
    /// mute.
    pub max_violations: u32,

    /// Mute duration the caller applies on escalation, in seconds.
    pub mute_secs: u64,

    /// Length of the violation accumulation window, in milliseconds.
    pub violation_reset_ms: u64,

    /// Default number of leaderboard rows.
    pub leaderboard_limit: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            hit_cooldown_ms: 3_000,
            command_cooldown_ms: 1_000,
            max_violations: 5,
            mute_secs: 300,
            violation_reset_ms: 60_000,
            leaderboard_limit: 10,
        }
    }
}

impl BotConfig {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_file() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
    }

    /// The slice of configuration the rate limiter needs, with durations
    /// already materialized.
    pub fn limiter(&self) -> LimiterConfig {
        LimiterConfig {
            hit_cooldown: Duration::from_millis(self.hit_cooldown_ms),
            command_cooldown: Duration::from_millis(self.command_cooldown_ms),
            violation_reset: Duration::from_millis(self.violation_reset_ms),
        }
    }

    pub fn mute_duration(&self) -> Duration {
        Duration::from_secs(self.mute_secs)
    }
}

/// Cooldown and violation-window settings consumed by the rate limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    pub hit_cooldown: Duration,
    pub command_cooldown: Duration,
    pub violation_reset: Duration,
}

/// Get the default config file location.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hitball").join("config.toml"))
}

fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("hitball").join("data.json"))
        .unwrap_or_else(|| PathBuf::from("data.json"))
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_historical_values() {
        let config = BotConfig::default();
        assert_eq!(config.hit_cooldown_ms, 3_000);
        assert_eq!(config.command_cooldown_ms, 1_000);
        assert_eq!(config.max_violations, 5);
        assert_eq!(config.mute_secs, 300);
        assert_eq!(config.violation_reset_ms, 60_000);
        assert_eq!(config.leaderboard_limit, 10);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
hit_cooldown_ms = 5000
max_violations = 3
data_file = "/tmp/hits.json"
"#;
        let config: BotConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.hit_cooldown_ms, 5_000);
        assert_eq!(config.max_violations, 3);
        assert_eq!(config.data_file, PathBuf::from("/tmp/hits.json"));
        // Unspecified keys fall back to defaults
        assert_eq!(config.command_cooldown_ms, 1_000);
        assert_eq!(config.mute_secs, 300);
    }

    #[test]
    fn test_limiter_config_durations() {
        let limiter = BotConfig::default().limiter();
        assert_eq!(limiter.hit_cooldown, Duration::from_secs(3));
        assert_eq!(limiter.command_cooldown, Duration::from_secs(1));
        assert_eq!(limiter.violation_reset, Duration::from_secs(60));
    }
}
