use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use super::profile::{RollingMsStats, StageTimings};

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

/// Texture cache hit/miss counters shared with the resource layer.
#[derive(Debug, Clone, Default)]
pub struct CacheCounters {
    inner: Arc<CacheCountersInner>,
}

#[derive(Debug, Default)]
struct CacheCountersInner {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheCounters {
    pub fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pending(&self) -> (u64, u64) {
        (
            self.inner.hits.load(Ordering::Relaxed),
            self.inner.misses.load(Ordering::Relaxed),
        )
    }

    fn take(&self) -> (u64, u64) {
        (
            self.inner.hits.swap(0, Ordering::Relaxed),
            self.inner.misses.swap(0, Ordering::Relaxed),
        )
    }
}

/// Statistics of the last completed window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub fps: u32,
    pub texture_hits: u64,
    pub texture_misses: u64,
    pub update: RollingMsStats,
    pub render: RollingMsStats,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<FrameStats>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(FrameStats::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> FrameStats {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: FrameStats) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// Per-window accumulators owned by the frame loop.
#[derive(Debug)]
pub(crate) struct StatsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    counters: CacheCounters,
    timings: StageTimings,
    last: FrameStats,
}

impl StatsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            frames: 0,
            counters: CacheCounters::default(),
            timings: StageTimings::new(),
            last: FrameStats::default(),
        }
    }

    pub(crate) fn counters(&self) -> CacheCounters {
        self.counters.clone()
    }

    pub(crate) fn set_counters(&mut self, counters: CacheCounters) {
        self.counters = counters;
    }

    pub(crate) fn last(&self) -> FrameStats {
        self.last
    }

    #[cfg(test)]
    pub(crate) fn frames_in_window(&self) -> u32 {
        self.frames
    }

    pub(crate) fn record_frame(&mut self, update: Duration, render: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.timings.record(update, render);
    }

    /// Closes the window once `interval` has elapsed; at most one snapshot
    /// per call even when several intervals were missed.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<FrameStats> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let (texture_hits, texture_misses) = self.counters.take();
        let timings = self.timings.snapshot();
        let snapshot = FrameStats {
            fps: self.frames,
            texture_hits,
            texture_misses,
            update: timings.update,
            render: timings.render,
        };

        self.interval_start = now;
        self.frames = 0;
        self.last = snapshot;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<FrameStats>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn window_snapshot_counts_frames_and_cache_traffic() {
        let base = Instant::now();
        let mut accumulator = StatsAccumulator::new(Duration::from_secs(1), base);
        let counters = accumulator.counters();

        for _ in 0..48 {
            accumulator.record_frame(Duration::from_millis(2), Duration::from_millis(6));
        }
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_millis(1_000))
            .expect("window closed");

        assert_eq!(snapshot.fps, 48);
        assert_eq!(snapshot.texture_hits, 2);
        assert_eq!(snapshot.texture_misses, 1);
        assert!((snapshot.render.avg_ms - 6.0).abs() < 0.01);
        assert_eq!(counters.pending(), (0, 0));
    }

    #[test]
    fn nothing_is_reset_before_the_window_ends() {
        let base = Instant::now();
        let mut accumulator = StatsAccumulator::new(Duration::from_secs(1), base);
        let counters = accumulator.counters();

        for step in 1..=5u32 {
            accumulator.record_frame(Duration::ZERO, Duration::ZERO);
            counters.record_miss();
            assert!(accumulator
                .maybe_snapshot(base + Duration::from_millis(150 * step as u64))
                .is_none());
            assert_eq!(accumulator.frames_in_window(), step);
            assert_eq!(counters.pending(), (0, step as u64));
        }
    }

    #[test]
    fn window_resets_exactly_once_per_interval() {
        let base = Instant::now();
        let mut accumulator = StatsAccumulator::new(Duration::from_secs(1), base);
        accumulator.record_frame(Duration::ZERO, Duration::ZERO);

        let first = base + Duration::from_millis(1_010);
        assert_eq!(accumulator.maybe_snapshot(first).map(|s| s.fps), Some(1));
        assert!(accumulator.maybe_snapshot(first).is_none());
        assert!(accumulator
            .maybe_snapshot(first + Duration::from_millis(999))
            .is_none());

        accumulator.record_frame(Duration::ZERO, Duration::ZERO);
        accumulator.record_frame(Duration::ZERO, Duration::ZERO);
        let second = accumulator
            .maybe_snapshot(first + Duration::from_millis(1_000))
            .expect("second window");
        assert_eq!(second.fps, 2);
        assert_eq!(accumulator.last(), second);
        assert_eq!(accumulator.frames_in_window(), 0);
    }

    #[test]
    fn snapshot_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        assert_eq!(handle.snapshot(), FrameStats::default());
    }

    #[test]
    fn publish_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let expected = FrameStats {
            fps: 50,
            texture_hits: 10,
            texture_misses: 3,
            ..FrameStats::default()
        };
        handle.publish(expected);

        assert_eq!(handle.snapshot(), expected);
    }
}
