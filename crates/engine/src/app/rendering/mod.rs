mod backend;
mod font;
mod frame;

pub use backend::{PixelsBackend, RenderBackend, RenderError};
pub use frame::{Coord, Image, ImageError, PixelFrame, Rgba};
pub(crate) use frame::{line_advance, text_size};
