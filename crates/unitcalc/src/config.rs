//! Configuration
//!
//! Read from `<config_dir>/unitcalc/config.toml` (or `--config`), then
//! overridden by `UNITCALC_ENGINE` and command-line flags. Every field has a
//! default, so an empty or missing file is a valid configuration.
//!
//! ```toml
//! [engine]
//! command = "numbat-engine --prelude"
//!
//! [storage]
//! data_dir = "/home/me/.local/share/unitcalc"
//! history_key = "history"
//! persist = true
//!
//! [input]
//! debounce_ms = 300
//! long_press_ms = 500
//! ```

use crate::error::ConfigError;
use crate::history::HISTORY_KEY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `engine.command`.
pub const ENGINE_ENV: &str = "UNITCALC_ENGINE";

const DEFAULT_ENGINE: &str = "unitcalc-engine";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub engine: EngineConfig,
    pub storage: StorageConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Program and arguments, split on whitespace.
    pub command: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_ENGINE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub history_key: String,
    /// When false, history lives only for the current session.
    pub persist: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            history_key: HISTORY_KEY.to_string(),
            persist: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub debounce_ms: u64,
    pub long_press_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            long_press_ms: 500,
        }
    }
}

impl Config {
    /// `<config_dir>/unitcalc/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("unitcalc").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `UNITCALC_ENGINE` if set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(command) = std::env::var(ENGINE_ENV)
            && !command.trim().is_empty()
        {
            self.engine.command = command;
        }
    }

    /// Directory holding the store and the log file.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("unitcalc")))
            .unwrap_or_else(|| PathBuf::from(".unitcalc"))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.input.debounce_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.input.long_press_ms)
    }
}
