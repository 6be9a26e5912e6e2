use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::{Coord, Image, PixelFrame};

/// Hosts reporting at least this many cursor colors get hardware cursors.
pub const HARDWARE_CURSOR_MIN_COLORS: u32 = 256;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("host does not support custom cursor images")]
    Unsupported,
    #[error("cursor install failed: {0}")]
    Install(String),
}

/// A resolved cursor: image layer plus hotspot layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorImage {
    pub name: String,
    pub image: Image,
    pub hotspot: Coord,
}

#[derive(Debug, Clone)]
pub enum CursorResource {
    Loading,
    Ready(Arc<CursorImage>),
}

impl CursorResource {
    pub fn ready(cursor: CursorImage) -> Self {
        Self::Ready(Arc::new(cursor))
    }
}

/// Windowing side of hardware cursor support.
pub trait CursorHost {
    fn max_cursor_colors(&self) -> u32;

    fn best_cursor_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width, height)
    }

    fn install_cursor(&mut self, image: &Image, hotspot: Coord) -> Result<(), CursorError>;

    /// Hides the platform pointer so only the drawn overlay is visible.
    fn hide_system_cursor(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Hardware,
    SoftwareOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorOutcome {
    Loading,
    Unchanged,
    Installed,
    Drawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    pub mode: CursorMode,
    pub last_installed: Option<Arc<CursorImage>>,
}

pub struct CursorController {
    state: CursorState,
}

impl CursorController {
    pub fn new(host: &mut dyn CursorHost) -> Self {
        let mode = if host.max_cursor_colors() >= HARDWARE_CURSOR_MIN_COLORS {
            CursorMode::Hardware
        } else {
            host.hide_system_cursor();
            CursorMode::SoftwareOverlay
        };
        debug!(?mode, "cursor_mode_selected");
        Self {
            state: CursorState {
                mode,
                last_installed: None,
            },
        }
    }

    pub fn mode(&self) -> CursorMode {
        self.state.mode
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Runs after every other draw of the frame so the overlay stays on top.
    pub fn update(
        &mut self,
        pointer: Coord,
        resource: &CursorResource,
        host: &mut dyn CursorHost,
        frame: &mut PixelFrame<'_>,
    ) -> CursorOutcome {
        let CursorResource::Ready(cursor) = resource else {
            return CursorOutcome::Loading;
        };

        if self.state.mode == CursorMode::Hardware {
            if self.is_installed(cursor) {
                return CursorOutcome::Unchanged;
            }
            match install_hardware(cursor, host) {
                Ok(()) => {
                    self.state.last_installed = Some(Arc::clone(cursor));
                    return CursorOutcome::Installed;
                }
                Err(error) => {
                    warn!(cursor = cursor.name.as_str(), error = %error, "cursor_fallback");
                    self.state.mode = CursorMode::SoftwareOverlay;
                    self.state.last_installed = None;
                    host.hide_system_cursor();
                }
            }
        }

        frame.blit(&cursor.image, pointer - cursor.hotspot);
        CursorOutcome::Drawn
    }

    /// Same resource, or one with identical name, pixels and hotspot.
    fn is_installed(&self, cursor: &Arc<CursorImage>) -> bool {
        self.state
            .last_installed
            .as_ref()
            .is_some_and(|last| Arc::ptr_eq(last, cursor) || **last == **cursor)
    }
}

fn install_hardware(cursor: &CursorImage, host: &mut dyn CursorHost) -> Result<(), CursorError> {
    let (width, height) = host.best_cursor_size(cursor.image.width(), cursor.image.height());
    let padded = cursor.image.padded_to(width, height);
    host.install_cursor(&padded, cursor.hotspot)
}
