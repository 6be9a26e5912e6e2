mod memory;
mod overlay;
mod tooltip;

pub(crate) use memory::{MemoryProbe, MemoryStats};
pub(crate) use overlay::{draw_overlay, OverlayData};
pub(crate) use tooltip::draw_tooltip;
