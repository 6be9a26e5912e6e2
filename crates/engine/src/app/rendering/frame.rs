use std::ops::{Add, Sub};
use std::path::Path;

use image::ImageReader;
use thiserror::Error;

use super::font::{glyph_bits, glyph_pixel, GLYPH_HEIGHT, GLYPH_WIDTH};

pub type Rgba = [u8; 4];

/// Integer pixel position, origin at the top-left of the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ZERO: Coord = Coord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn clamp_min(self, min: Coord) -> Self {
        Self {
            x: self.x.max(min.x),
            y: self.y.max(min.y),
        }
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to open image {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("pixel buffer of {len} bytes does not match {width}x{height} rgba")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// Owned straight-alpha RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Image {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ImageError> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                len: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn load_png(path: &Path) -> Result<Self, ImageError> {
        let display = path.display().to_string();
        let reader = ImageReader::open(path).map_err(|source| ImageError::Open {
            path: display.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| ImageError::Decode {
            path: display,
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Coord {
        Coord::new(self.width as i32, self.height as i32)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(out)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[offset..offset + 4].copy_from_slice(&color);
    }

    /// Copies the image into the top-left corner of a transparent canvas of
    /// at least `width` x `height`. Never shrinks.
    pub fn padded_to(&self, width: u32, height: u32) -> Image {
        let width = width.max(self.width);
        let height = height.max(self.height);
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Image::filled(width, height, [0, 0, 0, 0]);
        let src_row = self.width as usize * 4;
        let dst_row = width as usize * 4;
        for row in 0..self.height as usize {
            out.rgba[row * dst_row..row * dst_row + src_row]
                .copy_from_slice(&self.rgba[row * src_row..(row + 1) * src_row]);
        }
        out
    }
}

/// Mutable view over an RGBA8 frame buffer.
pub struct PixelFrame<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    text_scale: i32,
}

impl<'a> PixelFrame<'a> {
    pub fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            text_scale: 1,
        }
    }

    pub fn with_text_scale(mut self, scale: i32) -> Self {
        self.text_scale = scale.max(1);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Coord {
        Coord::new(self.width as i32, self.height as i32)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let offset = self.byte_offset(x, y)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(out)
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let dst = &mut self.pixels[offset..offset + 4];
        match color[3] {
            0 => {}
            255 => dst.copy_from_slice(&color),
            alpha => {
                let a = alpha as u32;
                for channel in 0..3 {
                    let blended = (color[channel] as u32 * a + dst[channel] as u32 * (255 - a)) / 255;
                    dst[channel] = blended as u8;
                }
                dst[3] = dst[3].max(alpha);
            }
        }
    }

    pub fn fill_rect(&mut self, origin: Coord, size: Coord, color: Rgba) {
        let start_x = origin.x.max(0);
        let start_y = origin.y.max(0);
        let end_x = (origin.x + size.x).min(self.width as i32);
        let end_y = (origin.y + size.y).min(self.height as i32);
        if end_x <= start_x || end_y <= start_y {
            return;
        }
        for y in start_y..end_y {
            for x in start_x..end_x {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub fn rect_outline(&mut self, origin: Coord, size: Coord, color: Rgba) {
        if size.x <= 1 || size.y <= 1 {
            return;
        }
        self.fill_rect(origin, Coord::new(size.x, 1), color);
        self.fill_rect(
            Coord::new(origin.x, origin.y + size.y - 1),
            Coord::new(size.x, 1),
            color,
        );
        self.fill_rect(Coord::new(origin.x, origin.y + 1), Coord::new(1, size.y - 2), color);
        self.fill_rect(
            Coord::new(origin.x + size.x - 1, origin.y + 1),
            Coord::new(1, size.y - 2),
            color,
        );
    }

    pub fn blit(&mut self, image: &Image, origin: Coord) {
        for y in 0..image.height() {
            for x in 0..image.width() {
                if let Some(color) = image.pixel(x, y) {
                    self.blend_pixel(origin.x + x as i32, origin.y + y as i32, color);
                }
            }
        }
    }

    pub fn text_size(&self, text: &str) -> Coord {
        text_size(text, self.text_scale)
    }

    /// Draws `text` with its top-left corner at `origin`. Characters without
    /// a glyph advance like a space.
    pub fn text(&mut self, origin: Coord, text: &str, color: Rgba) {
        let scale = self.text_scale;
        let mut x = origin.x;
        for ch in text.chars() {
            if let Some(bits) = glyph_bits(ch) {
                for row in 0..GLYPH_HEIGHT {
                    for col in 0..GLYPH_WIDTH {
                        if glyph_pixel(bits, col, row) {
                            self.fill_rect(
                                Coord::new(x + col * scale, origin.y + row * scale),
                                Coord::new(scale, scale),
                                color,
                            );
                        }
                    }
                }
            }
            x += glyph_advance(scale);
        }
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?
            .checked_mul(4)?;
        (offset + 4 <= self.pixels.len()).then_some(offset)
    }
}

pub(crate) fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale
}

pub(crate) fn line_advance(scale: i32) -> i32 {
    (GLYPH_HEIGHT + 2) * scale
}

pub(crate) fn text_size(text: &str, scale: i32) -> Coord {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        return Coord::ZERO;
    }
    Coord::new(chars * glyph_advance(scale) - scale, GLYPH_HEIGHT * scale)
}
