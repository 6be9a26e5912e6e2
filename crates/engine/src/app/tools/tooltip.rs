use crate::app::{Coord, Image, PixelFrame, Rgba, TextLabel, Tooltip};

const BORDER_COLOR: Rgba = [244, 247, 21, 192];
const FILL_COLOR: Rgba = [35, 35, 35, 192];
const PLAIN_TEXT_COLOR: Rgba = [255, 255, 255, 255];
const BORDER_PAD: i32 = 3;
const FILL_PAD: i32 = 2;

/// Places the tooltip up and to the left of the pointer, pinned to the
/// top/left edges.
pub(crate) fn tooltip_origin(pointer: Coord, size: Coord) -> Coord {
    (pointer - size).clamp_min(Coord::ZERO)
}

/// Draws the tooltip for `tooltip`. Returns false when there was nothing to
/// show (an empty plain string).
pub(crate) fn draw_tooltip(frame: &mut PixelFrame<'_>, pointer: Coord, tooltip: &Tooltip) -> bool {
    let label;
    let body = match tooltip {
        Tooltip::Text(text) => Body::Text(text),
        Tooltip::Image(image) => Body::Image(image),
        Tooltip::Plain(text) if text.is_empty() => return false,
        Tooltip::Plain(text) => {
            label = TextLabel::new(text.as_str(), PLAIN_TEXT_COLOR);
            Body::Text(&label)
        }
    };

    let size = match &body {
        Body::Text(label) => frame.text_size(&label.text),
        Body::Image(image) => image.size(),
    };
    let origin = tooltip_origin(pointer, size);

    frame.rect_outline(
        origin - Coord::new(BORDER_PAD, BORDER_PAD),
        size + Coord::new(BORDER_PAD * 2, BORDER_PAD * 2),
        BORDER_COLOR,
    );
    frame.fill_rect(
        origin - Coord::new(FILL_PAD, FILL_PAD),
        size + Coord::new(FILL_PAD * 2, FILL_PAD * 2),
        FILL_COLOR,
    );
    match body {
        Body::Text(label) => frame.text(origin, &label.text, label.color),
        Body::Image(image) => frame.blit(image, origin),
    }
    true
}

enum Body<'a> {
    Text(&'a TextLabel),
    Image(&'a Image),
}
