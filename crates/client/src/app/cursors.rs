use std::path::Path;

use engine::{Coord, CursorImage, CursorResource, Image, ImageError, Rgba};

const CURSOR_FILL: Rgba = [250, 250, 250, 255];
const CURSOR_OUTLINE: Rgba = [16, 16, 16, 255];

#[derive(Debug, Clone)]
pub(crate) struct CursorSet {
    pub(crate) arrow: CursorResource,
    pub(crate) hand: CursorResource,
}

impl CursorSet {
    pub(crate) fn procedural() -> Self {
        Self {
            arrow: CursorResource::ready(CursorImage {
                name: "arrow".to_string(),
                image: rasterize(12, 17, |x, y| x <= y && 2 * y + x <= 32),
                hotspot: Coord::ZERO,
            }),
            hand: CursorResource::ready(CursorImage {
                name: "hand".to_string(),
                image: rasterize(14, 18, |x, y| {
                    let finger = (4..=7).contains(&x) && y <= 9;
                    let palm = (1..=12).contains(&x) && (8..=16).contains(&y);
                    finger || palm
                }),
                hotspot: Coord::new(5, 0),
            }),
        }
    }
}

/// PNG cursor with its hotspot in the top-left corner.
pub(crate) fn load_cursor(name: &str, path: &Path) -> Result<CursorResource, ImageError> {
    let image = Image::load_png(path)?;
    Ok(CursorResource::ready(CursorImage {
        name: name.to_string(),
        image,
        hotspot: Coord::ZERO,
    }))
}

/// Fills the shape and outlines every edge pixel.
fn rasterize(width: u32, height: u32, inside: impl Fn(i32, i32) -> bool) -> Image {
    let mut image = Image::filled(width, height, [0, 0, 0, 0]);
    let in_bounds = |x: i32, y: i32| x >= 0 && y >= 0 && x < width as i32 && y < height as i32;
    let covered = |x: i32, y: i32| in_bounds(x, y) && inside(x, y);

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if !covered(x, y) {
                continue;
            }
            let edge = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                .iter()
                .any(|(dx, dy)| !covered(x + dx, y + dy));
            let color = if edge { CURSOR_OUTLINE } else { CURSOR_FILL };
            image.set_pixel(x as u32, y as u32, color);
        }
    }
    image
}
