//! Host configuration for the clock-dream binary
//!
//! Structured TOML with one table per concern. Every field has a serde
//! default so partial files load; values are clamped after loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::EngineSettings;
use crate::constants::{gesture, timing, validation};
use crate::gesture::GestureThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub gestures: GestureSettings,
    #[serde(default)]
    pub burn_in: BurnInSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How often a running session re-reads the preferences file
    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSettings {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold_dp: f32,
    #[serde(default = "default_tap_slop")]
    pub tap_slop_dp: f32,
    #[serde(default = "default_tap_timeout_ms")]
    pub tap_timeout_ms: u64,
    /// Device pixels per density-independent unit
    #[serde(default = "default_density")]
    pub density: f32,
    /// Ignore exit taps (experimental)
    #[serde(default)]
    pub touch_guard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnInSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_max_shift")]
    pub max_shift_px: i32,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_reload_interval_ms() -> u64 {
    1_000
}

fn default_swipe_threshold() -> f32 {
    gesture::SWIPE_THRESHOLD_DP
}

fn default_tap_slop() -> f32 {
    gesture::TAP_SLOP_DP
}

fn default_tap_timeout_ms() -> u64 {
    gesture::TAP_TIMEOUT_MS
}

fn default_density() -> f32 {
    1.0
}

fn default_interval_secs() -> u64 {
    timing::BURN_IN_INTERVAL_SECS
}

fn default_max_shift() -> i32 {
    timing::BURN_IN_MAX_SHIFT
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            reload_interval_ms: default_reload_interval_ms(),
        }
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            swipe_threshold_dp: default_swipe_threshold(),
            tap_slop_dp: default_tap_slop(),
            tap_timeout_ms: default_tap_timeout_ms(),
            density: default_density(),
            touch_guard: false,
        }
    }
}

impl Default for BurnInSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_shift_px: default_max_shift(),
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from `path`, writing a default file there first if none exists
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, creating default config at {:?}", path);
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }
        Self::read(path)
    }

    /// Load from `path` without touching the filesystem when it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        Self::read(path)
    }

    /// `general.log_level` from the file at `path`, if it is readable.
    /// Used before logging is installed, so it reports nothing.
    pub fn peek_log_level(path: &Path) -> Option<String> {
        let table: toml::Table = fs::read_to_string(path).ok()?.parse().ok()?;
        table
            .get("general")?
            .get("log_level")?
            .as_str()
            .map(str::to_string)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from {:?}", path))?;
        config.validate_and_clamp();

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }
        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, toml_string).with_context(|| format!("Failed to write config to {:?}", path))?;
        info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Clamp values to safe ranges
    fn validate_and_clamp(&mut self) {
        if self.general.reload_interval_ms < validation::MIN_RELOAD_INTERVAL_MS {
            warn!(reload_interval_ms = self.general.reload_interval_ms, min = validation::MIN_RELOAD_INTERVAL_MS, "reload_interval_ms below minimum, clamping");
            self.general.reload_interval_ms = validation::MIN_RELOAD_INTERVAL_MS;
        }

        if !(self.gestures.density >= validation::MIN_DENSITY) {
            warn!(density = self.gestures.density, using = default_density(), "density invalid, using default");
            self.gestures.density = default_density();
        }
        if !(self.gestures.swipe_threshold_dp > 0.0) {
            warn!(swipe_threshold_dp = self.gestures.swipe_threshold_dp, using = default_swipe_threshold(), "swipe_threshold_dp invalid, using default");
            self.gestures.swipe_threshold_dp = default_swipe_threshold();
        }
        if !(self.gestures.tap_slop_dp > 0.0) {
            warn!(tap_slop_dp = self.gestures.tap_slop_dp, using = default_tap_slop(), "tap_slop_dp invalid, using default");
            self.gestures.tap_slop_dp = default_tap_slop();
        }

        if self.burn_in.interval_secs < validation::MIN_BURN_IN_INTERVAL_SECS {
            warn!(interval_secs = self.burn_in.interval_secs, min = validation::MIN_BURN_IN_INTERVAL_SECS, "burn_in interval below minimum, clamping");
            self.burn_in.interval_secs = validation::MIN_BURN_IN_INTERVAL_SECS;
        }
        let clamped = self.burn_in.max_shift_px.clamp(0, validation::MAX_SHIFT_PX);
        if clamped != self.burn_in.max_shift_px {
            warn!(max_shift_px = self.burn_in.max_shift_px, clamped = clamped, "max_shift_px out of range, clamping");
            self.burn_in.max_shift_px = clamped;
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            burn_in_interval: Duration::from_secs(self.burn_in.interval_secs),
            max_shift: self.burn_in.max_shift_px,
        }
    }

    /// Gesture thresholds in device pixels
    pub fn gesture_thresholds(&self) -> GestureThresholds {
        GestureThresholds {
            swipe_threshold: self.gestures.swipe_threshold_dp,
            tap_slop: self.gestures.tap_slop_dp,
            tap_timeout: Duration::from_millis(self.gestures.tap_timeout_ms),
        }
        .scaled(self.gestures.density)
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_millis(self.general.reload_interval_ms)
    }
}
