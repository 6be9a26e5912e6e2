use std::path::PathBuf;
use std::process::ExitCode;

use engine::{
    load_loop_config, CacheCounters, FullscreenRequests, LoopConfig, LoopServices, MetricsHandle,
    ProfileHandle, Ui,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use super::cursors::{self, CursorSet};
use super::hud::HudScene;
use super::icons::IconCache;

const CURSOR_IMAGE_ENV_VAR: &str = "PANEL_CURSOR_IMAGE";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Ui>,
    pub(crate) fullscreen: FullscreenRequests,
    pub(crate) services: LoopServices,
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Panel Startup ===");

    let config = load_loop_config().map_err(|err| {
        error!(error = %err, "config_failed");
        ExitCode::FAILURE
    })?;

    let fullscreen = FullscreenRequests::default();
    let cache = CacheCounters::default();
    let icons = IconCache::new(cache.clone());
    let services = LoopServices {
        metrics: MetricsHandle::default(),
        profile: Some(ProfileHandle::with_capacity(config.profile_history)),
        cache,
        resources: Some(Box::new(icons.stats())),
    };
    let scene = HudScene::new(
        config.window_width,
        config.window_height,
        fullscreen.clone(),
        load_cursor_set(),
        icons,
    );

    Ok(AppWiring {
        config,
        scene: Box::new(scene),
        fullscreen,
        services,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_cursor_set() -> CursorSet {
    let mut set = CursorSet::procedural();
    let Some(path) = std::env::var_os(CURSOR_IMAGE_ENV_VAR).map(PathBuf::from) else {
        return set;
    };
    match cursors::load_cursor("custom", &path) {
        Ok(cursor) => {
            info!(path = %path.display(), "cursor_image_loaded");
            set.arrow = cursor;
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cursor_image_failed");
        }
    }
    set
}
