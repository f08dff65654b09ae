//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/keytrace/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/keytrace/` (~/.config/keytrace/)
//! - Data: `$XDG_DATA_HOME/keytrace/` (~/.local/share/keytrace/)
//! - State/Logs: `$XDG_STATE_HOME/keytrace/` (~/.local/state/keytrace/)

use crate::encoder::EncodeStrategy;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Replay timing and speed limits
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Recording behavior
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Replay timing and speed limits
#[derive(Debug, Deserialize, Clone)]
pub struct PlaybackConfig {
    /// Initial speed factor
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Lowest allowed speed factor
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Highest allowed speed factor
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Increment for faster/slower controls
    #[serde(default = "default_speed_step")]
    pub speed_step: f64,

    /// Floor for every scheduled delay, in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Delay before the last event is applied, in milliseconds
    #[serde(default = "default_trailing_delay_ms")]
    pub trailing_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            speed_step: default_speed_step(),
            min_delay_ms: default_min_delay_ms(),
            trailing_delay_ms: default_trailing_delay_ms(),
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.min_speed.is_nan() || self.min_speed <= 0.0 {
            return Err(Error::Config(
                "playback.min_speed must be positive".to_string(),
            ));
        }
        if self.max_speed.is_nan() || self.max_speed < self.min_speed {
            return Err(Error::Config(
                "playback.max_speed must not be below playback.min_speed".to_string(),
            ));
        }
        if self.speed_step.is_nan() || self.speed_step <= 0.0 {
            return Err(Error::Config(
                "playback.speed_step must be positive".to_string(),
            ));
        }
        if self.min_delay_ms == 0 {
            return Err(Error::Config(
                "playback.min_delay_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_speed() -> f64 {
    1.0
}

fn default_min_speed() -> f64 {
    0.5
}

fn default_max_speed() -> f64 {
    5.0
}

fn default_speed_step() -> f64 {
    0.5
}

fn default_min_delay_ms() -> u64 {
    10
}

fn default_trailing_delay_ms() -> u64 {
    500
}

/// Recording configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RecordingConfig {
    /// How text changes are diffed into events
    #[serde(default)]
    pub strategy: EncodeStrategy,

    /// Where saved recordings go (defaults to the data directory)
    pub output_dir: Option<PathBuf>,
}

impl RecordingConfig {
    /// Directory for saved recordings and text exports
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(Config::recordings_dir)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.playback.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/keytrace/config.toml` (~/.config/keytrace/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("keytrace").join("config.toml")
    }

    /// Returns the data directory path
    ///
    /// `$XDG_DATA_HOME/keytrace/` (~/.local/share/keytrace/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("keytrace")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/keytrace/` (~/.local/state/keytrace/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("keytrace")
    }

    /// Returns the default directory for saved recordings
    ///
    /// `$XDG_DATA_HOME/keytrace/recordings/`
    pub fn recordings_dir() -> PathBuf {
        Self::data_dir().join("recordings")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/keytrace/keytrace.log` (~/.local/state/keytrace/keytrace.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("keytrace.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
