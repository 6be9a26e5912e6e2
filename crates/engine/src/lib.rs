use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub mod app;

pub use app::{
    run_app, run_app_with_services, wall_clock_millis, AppError, Buff, BuffId, BuffTable,
    CacheCounters, ConfigError, Coord, CountdownState, CursorController, CursorError, CursorHost,
    CursorImage, CursorMode, CursorOutcome, CursorResource, CursorState, DisplayMode,
    DisplayModeBackend, DisplayModeError, EventQueue, FrameError, FrameLoop, FrameStats,
    FrameStatus, FullscreenRequests, FullscreenSync, Image, ImageError, InputEvent, InputKind,
    KeyCode, LoopConfig, LoopServices, MetricsHandle, ModifiersState, NoResourceStats,
    PanelHandle, PanelParts, PixelFrame, PixelsBackend, PointerButton, ProfileFrame, ProfileHandle, RenderBackend,
    RenderError, ResourceStats, Rgba, RollingMsStats, SceneError, TextLabel, Tooltip, Ui,
    DEBUG_TEXT_ENV_VAR, DEFAULT_PROFILE_HISTORY, FRAME_PERIOD_ENV_VAR,
    HARDWARE_CURSOR_MIN_COLORS, PROFILE_ENV_VAR, TICK_SECONDS,
};

pub const CONFIG_ENV_VAR: &str = "PANEL_CONFIG";
const DEFAULT_CONFIG_RELATIVE: [&str; 2] = ["config", "panel.json"];

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("{var} is set but does not point to a file: {path}")]
    InvalidEnvConfig { var: &'static str, path: PathBuf },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reads the loop config from `PANEL_CONFIG`, else the nearest
/// `config/panel.json` above the executable, else defaults; env overrides
/// are applied last.
pub fn load_loop_config() -> Result<LoopConfig, StartupError> {
    let config = match resolve_config_path()? {
        Some(path) => {
            let config = LoopConfig::load(&path)?;
            info!(path = %path.display(), "config_loaded");
            config
        }
        None => {
            info!("config_defaults");
            LoopConfig::default()
        }
    };
    Ok(config.with_env_overrides())
}

pub fn resolve_config_path() -> Result<Option<PathBuf>, StartupError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) => {
            let path = normalize_path(&PathBuf::from(value));
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(StartupError::InvalidEnvConfig {
                    var: CONFIG_ENV_VAR,
                    path,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            Ok(find_config_upward(&exe_dir))
        }
        Err(source) => Err(StartupError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}

fn find_config_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(config_candidate)
        .find(|candidate| candidate.is_file())
        .map(|candidate| normalize_path(&candidate))
}

fn config_candidate(dir: &Path) -> PathBuf {
    DEFAULT_CONFIG_RELATIVE
        .iter()
        .fold(dir.to_path_buf(), |path, part| path.join(part))
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
