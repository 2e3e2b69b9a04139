//! Configuration for termcanvas sessions.
//!
//! Settings are read from `~/.termcanvas/config.toml`:
//!
//! ```toml
//! # Minimum log level: all, debug, info, error, none
//! log_level = "info"
//!
//! # Append log lines here instead of stderr (stderr would draw over the canvas)
//! log_file = "/tmp/termcanvas.log"
//!
//! # Key source: "scan" reads bytes from stdin each poll,
//! # "listener" receives key down/up events from a background thread
//! input = "listener"
//!
//! # Report one row less than the terminal has, leaving a status line free
//! reserve_status_line = true
//!
//! # Wrap each frame in synchronized-update sequences
//! synchronized_output = true
//!
//! [listener]
//! channel_capacity = 256
//! poll_interval_ms = 20
//! ```
//!
//! Every field is optional; missing fields take their default.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::LogLevel;

/// Which key source feeds the key state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Drain buffered input bytes on every poll
    #[default]
    Scan,
    /// Background listener delivering key down/up events
    Listener,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level of log lines to emit
    pub log_level: LogLevel,
    /// Log file path; stderr when unset
    pub log_file: Option<PathBuf>,
    /// Key source selection
    pub input: InputMode,
    /// Keep the last terminal row out of the canvas
    pub reserve_status_line: bool,
    /// Use synchronized output around each frame
    pub synchronized_output: bool,
    /// Listener settings
    pub listener: ListenerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Error,
            log_file: None,
            input: InputMode::Scan,
            reserve_status_line: true,
            synchronized_output: true,
            listener: ListenerConfig::default(),
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Capacity of the key event channel
    pub channel_capacity: usize,
    /// How often the listener thread wakes to check for shutdown
    pub poll_interval_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            poll_interval_ms: 20,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(config) = Self::from_toml(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Get config file path
    pub fn get_config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termcanvas").join("config.toml"))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
