use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::controller::DEFAULT_TICK_INTERVAL;
use crate::error::{Result, TaprError};

/// Keys bound to game commands; the tap key may not shadow them
pub const RESERVED_KEYS: [char; 3] = ['s', 'r', 'q'];

pub const MIN_TICK_MS: u64 = 10;
pub const MAX_TICK_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tick_interval_ms: u64,
    pub tap_key: char,
    pub mouse: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            tap_key: ' ',
            mouse: true,
        }
    }
}

impl From<&RuntimeSettings> for Config {
    fn from(rs: &RuntimeSettings) -> Self {
        Self {
            tick_interval_ms: rs.tick_interval.as_millis() as u64,
            tap_key: rs.tap_key,
            mouse: rs.mouse,
        }
    }
}

/// Command-line values that win over the stored config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub tick_interval_ms: Option<u64>,
    pub tap_key: Option<char>,
    pub no_mouse: bool,
}

/// Fully resolved and validated settings the app runs with
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub tick_interval: Duration,
    pub tap_key: char,
    pub mouse: bool,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            tap_key: ' ',
            mouse: true,
        }
    }
}

impl RuntimeSettings {
    pub fn resolve(cfg: &Config, overrides: &Overrides) -> Result<Self> {
        let tick_ms = overrides.tick_interval_ms.unwrap_or(cfg.tick_interval_ms);
        if !(MIN_TICK_MS..=MAX_TICK_MS).contains(&tick_ms) {
            return Err(TaprError::TickInterval(tick_ms));
        }

        let tap_key = overrides.tap_key.unwrap_or(cfg.tap_key);
        if RESERVED_KEYS.contains(&tap_key.to_ascii_lowercase()) {
            return Err(TaprError::ReservedTapKey(tap_key));
        }

        Ok(Self {
            tick_interval: Duration::from_millis(tick_ms),
            tap_key,
            mouse: cfg.mouse && !overrides.no_mouse,
        })
    }

    /// Human label for the tap key, used in the legend
    pub fn tap_key_label(&self) -> String {
        match self.tap_key {
            ' ' => "space".to_string(),
            c => c.to_string(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("tapr_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!(
                    "ignoring unreadable config {}: {e}",
                    self.path.display()
                );
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
