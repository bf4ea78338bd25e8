// src/config.rs - Runtime settings with file overrides
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frames of raw history the smoother votes over.
    pub smoothing_window: usize,
    /// Share of the history (percent) a label needs before the stable label flips.
    pub switch_ratio_percent: u8,
    pub cooldown_secs: f64,
    pub volume_step: u8,
    pub mid_joint_tolerance_px: f64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub target_fps: u32,
    pub track_refresh_secs: f64,
    pub command_timeout_ms: u64,
    pub hand_index: usize,
    pub record_session: bool,
    pub session_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            switch_ratio_percent: 60,
            cooldown_secs: 1.0,
            volume_step: 5,
            mid_joint_tolerance_px: 20.0,
            frame_width: 640,
            frame_height: 480,
            target_fps: 60,
            track_refresh_secs: 5.0,
            command_timeout_ms: 2000,
            hand_index: 0,
            record_session: false,
            session_dir: default_session_dir(),
        }
    }
}

fn default_session_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.document_dir().map(|p| p.join("GestureRemote")))
        .unwrap_or_else(|| PathBuf::from("./sessions"))
}

/// `<platform config dir>/config.json`, e.g. `~/.config/gesture-remote/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gesture-remote")
        .map(|dirs| dirs.config_dir().join("config.json"))
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Explicit path if given, else the platform config file if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::Invalid("smoothing_window must be at least 1".into()));
        }
        if !(1..=100).contains(&self.switch_ratio_percent) {
            return Err(ConfigError::Invalid(
                "switch_ratio_percent must be within 1..=100".into(),
            ));
        }
        if Duration::try_from_secs_f64(self.cooldown_secs).is_err() {
            return Err(ConfigError::Invalid(
                "cooldown_secs must be a non-negative number of seconds".into(),
            ));
        }
        if self.target_fps == 0 {
            return Err(ConfigError::Invalid("target_fps must be positive".into()));
        }
        match Duration::try_from_secs_f64(self.track_refresh_secs) {
            Ok(period) if !period.is_zero() => {}
            _ => return Err(ConfigError::Invalid("track_refresh_secs must be positive".into())),
        }
        if self.volume_step > 100 {
            return Err(ConfigError::Invalid("volume_step must be at most 100".into()));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    pub fn track_refresh(&self) -> Duration {
        Duration::from_secs_f64(self.track_refresh_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
