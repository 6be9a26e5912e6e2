use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::{
    Coord, CursorResource, Image, KeyCode, ModifiersState, PixelFrame, PointerButton, Rgba,
};

/// A frame-level failure the loop shrugs off: the scene graph was
/// half-built or already torn down.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene not ready: {0}")]
    NotReady(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLabel {
    pub text: String,
    pub color: Rgba,
}

impl TextLabel {
    pub fn new(text: impl Into<String>, color: Rgba) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// What the widget under the pointer wants shown as a tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tooltip {
    Text(TextLabel),
    Image(Arc<Image>),
    Plain(String),
}

/// The scene graph driven by the frame loop.
///
/// Every method runs on the loop thread with the render lock held.
pub trait Ui: Send {
    fn tick(&mut self, delta: Duration) -> Result<(), SceneError>;

    fn key_down(&mut self, code: KeyCode, modifiers: ModifiersState) -> Result<(), SceneError>;
    fn key_up(&mut self, code: KeyCode, modifiers: ModifiersState) -> Result<(), SceneError>;
    fn key_char(&mut self, ch: char) -> Result<(), SceneError>;

    fn pointer_down(&mut self, position: Coord, button: PointerButton) -> Result<(), SceneError>;
    fn pointer_up(&mut self, position: Coord, button: PointerButton) -> Result<(), SceneError>;
    fn pointer_move(&mut self, position: Coord) -> Result<(), SceneError>;
    fn pointer_wheel(&mut self, position: Coord, delta: i32) -> Result<(), SceneError>;

    fn draw(&mut self, frame: &mut PixelFrame<'_>) -> Result<(), SceneError>;

    fn tooltip(&self, _pointer: Coord) -> Option<Tooltip> {
        None
    }

    fn cursor(&self, pointer: Coord) -> CursorResource;

    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Counters exposed by the resource cache for the diagnostics overlay.
pub trait ResourceStats: Send {
    /// Layered-image cache `(entries, cached)`.
    fn layer_cache(&self) -> Option<(usize, usize)> {
        None
    }

    fn pending_loads(&self) -> usize {
        0
    }

    fn loaded_count(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoResourceStats;

impl ResourceStats for NoResourceStats {}
