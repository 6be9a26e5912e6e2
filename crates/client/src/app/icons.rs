use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine::{CacheCounters, Image, ResourceStats, Rgba};
use tracing::debug;

pub(crate) const ICON_SIZE: u32 = 20;

const ICON_PALETTE: [Rgba; 6] = [
    [86, 156, 214, 255],
    [206, 145, 120, 255],
    [181, 206, 168, 255],
    [197, 134, 192, 255],
    [220, 220, 170, 255],
    [78, 201, 176, 255],
];

/// Buff icons rasterized on first use and kept for the session.
///
/// Every lookup counts as a texture hit or miss on the shared counters.
pub(crate) struct IconCache {
    icons: HashMap<String, Arc<Image>>,
    counters: CacheCounters,
    entries: Arc<AtomicUsize>,
}

impl IconCache {
    pub(crate) fn new(counters: CacheCounters) -> Self {
        Self {
            icons: HashMap::new(),
            counters,
            entries: Arc::default(),
        }
    }

    pub(crate) fn get(&mut self, resource: &str) -> Arc<Image> {
        if let Some(icon) = self.icons.get(resource) {
            self.counters.record_hit();
            return Arc::clone(icon);
        }

        self.counters.record_miss();
        let icon = Arc::new(rasterize_icon(resource));
        self.icons.insert(resource.to_string(), Arc::clone(&icon));
        self.entries.store(self.icons.len(), Ordering::Relaxed);
        debug!(resource, "icon_rasterized");
        icon
    }

    /// Cache view for the diagnostics overlay, readable from the loop side.
    pub(crate) fn stats(&self) -> IconCacheStats {
        IconCacheStats {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct IconCacheStats {
    entries: Arc<AtomicUsize>,
}

impl ResourceStats for IconCacheStats {
    fn layer_cache(&self) -> Option<(usize, usize)> {
        let entries = self.entries.load(Ordering::Relaxed);
        Some((entries, entries))
    }

    fn loaded_count(&self) -> usize {
        self.entries.load(Ordering::Relaxed)
    }
}

/// Diamond in a color picked from the resource name.
fn rasterize_icon(resource: &str) -> Image {
    let seed = resource
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as usize));
    let color = ICON_PALETTE[seed % ICON_PALETTE.len()];
    let center = ICON_SIZE as i32 / 2;

    let mut image = Image::filled(ICON_SIZE, ICON_SIZE, [0, 0, 0, 0]);
    for y in 0..ICON_SIZE as i32 {
        for x in 0..ICON_SIZE as i32 {
            if (x - center).abs() + (y - center).abs() < center {
                image.set_pixel(x as u32, y as u32, color);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_lookup_misses_then_hits() {
        let counters = CacheCounters::default();
        let mut cache = IconCache::new(counters.clone());

        let first = cache.get("gfx/hud/buffs/tea");
        let second = cache.get("gfx/hud/buffs/tea");
        cache.get("gfx/hud/buffs/swim");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counters.pending(), (1, 2));
    }

    #[test]
    fn stats_follow_the_cache_from_another_owner() {
        let mut cache = IconCache::new(CacheCounters::default());
        let stats = cache.stats();
        assert_eq!(stats.layer_cache(), Some((0, 0)));

        cache.get("gfx/hud/buffs/tea");
        cache.get("gfx/hud/buffs/swim");
        cache.get("gfx/hud/buffs/tea");

        assert_eq!(stats.layer_cache(), Some((2, 2)));
        assert_eq!(stats.loaded_count(), 2);
        assert_eq!(stats.pending_loads(), 0);
    }

    #[test]
    fn icon_is_a_centered_diamond() {
        let icon = rasterize_icon("gfx/hud/buffs/swim");
        let center = ICON_SIZE / 2;

        assert_eq!(icon.pixel(center, center).map(|pixel| pixel[3]), Some(255));
        assert_eq!(icon.pixel(0, 0), Some([0, 0, 0, 0]));
    }
}
