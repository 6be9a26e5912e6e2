use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Windowed,
    Fullscreen,
}

#[derive(Debug, Error)]
#[error("display mode change to {requested:?} failed: {reason}")]
pub struct DisplayModeError {
    pub requested: DisplayMode,
    pub reason: String,
}

/// Platform side of a display mode switch.
pub trait DisplayModeBackend: Send {
    fn current_mode(&self) -> DisplayMode;
    fn apply(&mut self, mode: DisplayMode) -> Result<(), DisplayModeError>;
}

/// Desired display mode, writable from any thread.
#[derive(Debug, Clone, Default)]
pub struct FullscreenRequests {
    want_fullscreen: Arc<AtomicBool>,
}

impl FullscreenRequests {
    pub fn request_fullscreen(&self) {
        self.want_fullscreen.store(true, Ordering::Release);
    }

    pub fn request_windowed(&self) {
        self.want_fullscreen.store(false, Ordering::Release);
    }

    pub fn toggle(&self) {
        self.want_fullscreen.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn desired(&self) -> DisplayMode {
        if self.want_fullscreen.load(Ordering::Acquire) {
            DisplayMode::Fullscreen
        } else {
            DisplayMode::Windowed
        }
    }

    fn reset_to(&self, mode: DisplayMode) {
        self.want_fullscreen
            .store(mode == DisplayMode::Fullscreen, Ordering::Release);
    }

    /// Moves `failed` back to `actual` unless another request landed since.
    fn withdraw(&self, failed: DisplayMode, actual: DisplayMode) -> bool {
        self.want_fullscreen
            .compare_exchange(
                failed == DisplayMode::Fullscreen,
                actual == DisplayMode::Fullscreen,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Applies the last requested display mode. Only called with the render lock
/// held, so a switch never lands in the middle of a draw.
pub struct FullscreenSync {
    requests: FullscreenRequests,
    actual: DisplayMode,
    backend: Box<dyn DisplayModeBackend>,
}

impl FullscreenSync {
    /// Starts in the platform's current mode; any intent recorded on
    /// `requests` before this point is discarded.
    pub fn new(backend: Box<dyn DisplayModeBackend>, requests: FullscreenRequests) -> Self {
        let actual = backend.current_mode();
        requests.reset_to(actual);
        Self {
            requests,
            actual,
            backend,
        }
    }

    pub fn requests(&self) -> FullscreenRequests {
        self.requests.clone()
    }

    pub fn actual(&self) -> DisplayMode {
        self.actual
    }

    /// Returns the mode switched to, or `None` when nothing changed.
    pub fn reconcile(&mut self) -> Option<DisplayMode> {
        let desired = self.requests.desired();
        if desired == self.actual {
            return None;
        }

        match self.backend.apply(desired) {
            Ok(()) => {
                info!(from = ?self.actual, to = ?desired, "display_mode_changed");
                self.actual = desired;
                Some(desired)
            }
            Err(error) => {
                let withdrawn = self.requests.withdraw(desired, self.actual);
                warn!(error = %error, withdrawn, "display_mode_change_failed");
                None
            }
        }
    }
}
