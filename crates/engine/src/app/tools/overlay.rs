use crate::app::rendering::{line_advance, text_size};
use crate::app::{Coord, FrameStats, PixelFrame, Rgba};

use super::MemoryStats;

const OVERLAY_PADDING: i32 = 6;
const OVERLAY_PANEL_INSET: Coord = Coord::new(4, 3);
const OVERLAY_TEXT_COLOR: Rgba = [244, 248, 252, 255];
const OVERLAY_PANEL_BG_COLOR: Rgba = [10, 12, 16, 210];
const OVERLAY_PANEL_BORDER_COLOR: Rgba = [92, 106, 126, 255];
const BYTES_PER_KIB: u64 = 1024;

#[derive(Debug, Clone, Default)]
pub(crate) struct OverlayData {
    pub stats: FrameStats,
    pub memory: Option<MemoryStats>,
    pub layer_cache: Option<(usize, usize)>,
    pub render_targets: usize,
    pub pending_loads: usize,
    pub loaded_count: usize,
    pub input_queue_depth: usize,
}

pub(crate) fn draw_overlay(frame: &mut PixelFrame<'_>, scale: i32, data: &OverlayData) {
    if frame.width() == 0 || frame.height() == 0 {
        return;
    }

    let lines = build_overlay_lines(data);
    let longest = lines
        .iter()
        .map(|line| text_size(line, scale).x)
        .max()
        .unwrap_or(0);
    let padding = OVERLAY_PADDING * scale;
    let inset = Coord::new(OVERLAY_PANEL_INSET.x * scale, OVERLAY_PANEL_INSET.y * scale);
    let panel_origin = Coord::new(padding, padding) - inset;
    let panel_size = Coord::new(
        longest + inset.x * 2,
        lines.len() as i32 * line_advance(scale) + inset.y * 2,
    );
    frame.fill_rect(panel_origin, panel_size, OVERLAY_PANEL_BG_COLOR);
    frame.rect_outline(panel_origin, panel_size, OVERLAY_PANEL_BORDER_COLOR);

    let mut y = padding;
    for line in &lines {
        frame.text(Coord::new(padding, y), line, OVERLAY_TEXT_COLOR);
        y += line_advance(scale);
    }
}

pub(crate) fn build_overlay_lines(data: &OverlayData) -> Vec<String> {
    let mut lines = vec![
        format!("FPS: {}", data.stats.fps),
        format!("Texhit: {}", data.stats.texture_hits),
        format!("Texmiss: {}", data.stats.texture_misses),
        format!(
            "Upd/Ren: {:.2}/{:.2} ms",
            data.stats.update.avg_ms, data.stats.render.avg_ms
        ),
    ];
    if let Some(memory) = data.memory {
        lines.push(format!(
            "Mem: {}/{}/{}/{} KiB",
            memory.free / BYTES_PER_KIB,
            memory.used / BYTES_PER_KIB,
            memory.total / BYTES_PER_KIB,
            memory.max / BYTES_PER_KIB
        ));
    }
    if let Some((entries, cached)) = data.layer_cache {
        lines.push(format!("LCache: {entries}/{cached}"));
    }
    lines.push(format!("RT-current: {}", data.render_targets));
    if data.pending_loads > 0 {
        lines.push(format!(
            "RQ depth: {} ({})",
            data.pending_loads, data.loaded_count
        ));
    }
    if data.input_queue_depth > 0 {
        lines.push(format!("EQ depth: {}", data.input_queue_depth));
    }
    lines
}
