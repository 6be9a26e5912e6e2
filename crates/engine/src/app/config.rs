use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const FRAME_PERIOD_ENV_VAR: &str = "PANEL_FRAME_MS";
pub const PROFILE_ENV_VAR: &str = "PANEL_PROFILE";
pub const DEBUG_TEXT_ENV_VAR: &str = "PANEL_DEBUG_TEXT";

const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(20);
const DEFAULT_STATS_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub frame_period_ms: u64,
    pub stats_window_ms: u64,
    pub profile: bool,
    pub profile_history: usize,
    pub debug_text: bool,
    pub render_enabled: bool,
    pub text_scale: i32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Panel".to_string(),
            window_width: 800,
            window_height: 600,
            frame_period_ms: DEFAULT_FRAME_PERIOD.as_millis() as u64,
            stats_window_ms: DEFAULT_STATS_WINDOW.as_millis() as u64,
            profile: false,
            profile_history: crate::app::DEFAULT_PROFILE_HISTORY,
            debug_text: false,
            render_enabled: true,
            text_scale: 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path} at `{field}`: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoopConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            field: error.path().to_string(),
            source: error.into_inner(),
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
        let deserializer = &mut serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(deserializer)
    }

    pub fn frame_period(&self) -> Duration {
        normalize_non_zero_duration(Duration::from_millis(self.frame_period_ms), DEFAULT_FRAME_PERIOD)
    }

    pub fn stats_window(&self) -> Duration {
        normalize_non_zero_duration(Duration::from_millis(self.stats_window_ms), DEFAULT_STATS_WINDOW)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(frame_ms) = read_env_u64(FRAME_PERIOD_ENV_VAR) {
            self.frame_period_ms = frame_ms;
        }
        if let Some(flag) = read_env_flag(PROFILE_ENV_VAR) {
            self.profile = flag;
        }
        if let Some(flag) = read_env_flag(DEBUG_TEXT_ENV_VAR) {
            self.debug_text = flag;
        }
        self
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn read_env_u64(var: &'static str) -> Option<u64> {
    let value = read_env(var)?;
    match value.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(
                env_var = var,
                value = value.as_str(),
                "invalid numeric env var value; falling back to config"
            );
            None
        }
    }
}

fn read_env_flag(var: &'static str) -> Option<bool> {
    let value = read_env(var)?;
    match parse_flag(&value) {
        Some(flag) => Some(flag),
        None => {
            warn!(
                env_var = var,
                value = value.as_str(),
                "invalid flag env var value; falling back to config"
            );
            None
        }
    }
}

fn read_env(var: &'static str) -> Option<String> {
    match env::var(var) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!(env_var = var, error = %err, "unable to read env var; falling back to config");
            None
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
