use std::sync::Arc;

use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use winit::window::Window;

use super::PixelFrame;

/// Failures the loop cannot recover from on its own.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pixels surface failed: {0}")]
    Pixels(#[from] pixels::Error),
    #[error("render context lost: {0}")]
    ContextLost(String),
}

/// Frame setup, target access and presentation for one window surface.
///
/// Implementations are owned by the loop thread and never touched by the
/// scene graph directly.
pub trait RenderBackend {
    /// Flushes cached render-target draws before the main target is cleared.
    fn render_deferred(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn frame(&mut self) -> PixelFrame<'_>;

    fn present(&mut self) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn render_target_count(&self) -> usize {
        0
    }
}

pub struct PixelsBackend {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    text_scale: i32,
}

impl PixelsBackend {
    pub fn new(window: Arc<Window>, text_scale: i32) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
            text_scale,
        })
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, pixels::Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }
}

impl RenderBackend for PixelsBackend {
    fn frame(&mut self) -> PixelFrame<'_> {
        let (width, height) = (self.width.max(1), self.height.max(1));
        PixelFrame::new(self.pixels.frame_mut(), width, height).with_text_scale(self.text_scale)
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.pixels.render().map_err(RenderError::from)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}
