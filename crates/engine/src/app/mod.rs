mod buffs;
mod config;
mod countdown;
mod cursor;
mod event_queue;
mod fullscreen;
mod host;
mod input;
mod loop_runner;
mod metrics;
mod profile;
mod rendering;
mod tools;
mod ui;

pub use buffs::{Buff, BuffId, BuffTable};
pub use config::{
    ConfigError, LoopConfig, DEBUG_TEXT_ENV_VAR, FRAME_PERIOD_ENV_VAR, PROFILE_ENV_VAR,
};
pub use countdown::{CountdownState, TICK_SECONDS};
pub use cursor::{
    CursorController, CursorError, CursorHost, CursorImage, CursorMode, CursorOutcome,
    CursorResource, CursorState, HARDWARE_CURSOR_MIN_COLORS,
};
pub use event_queue::{wall_clock_millis, EventQueue};
pub use fullscreen::{
    DisplayMode, DisplayModeBackend, DisplayModeError, FullscreenRequests, FullscreenSync,
};
pub use host::{run_app, run_app_with_services, AppError};
pub use input::{InputEvent, InputKind, KeyCode, ModifiersState, PointerButton};
pub use loop_runner::{
    FrameError, FrameLoop, FrameStatus, LoopServices, PanelHandle, PanelParts,
};
pub use metrics::{CacheCounters, FrameStats, MetricsHandle};
pub use profile::{ProfileFrame, ProfileHandle, RollingMsStats, DEFAULT_PROFILE_HISTORY};
pub use rendering::{
    Coord, Image, ImageError, PixelFrame, PixelsBackend, RenderBackend, RenderError, Rgba,
};
pub use ui::{NoResourceStats, ResourceStats, SceneError, TextLabel, Tooltip, Ui};
