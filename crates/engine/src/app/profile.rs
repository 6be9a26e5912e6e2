use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub(crate) const TIMING_WINDOW_LEN: usize = 120;
pub const DEFAULT_PROFILE_HISTORY: usize = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingMsStats {
    pub last_ms: f32,
    pub avg_ms: f32,
    pub max_ms: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct StageTimingsSnapshot {
    pub update: RollingMsStats,
    pub render: RollingMsStats,
}

/// Rolling update (tick + dispatch) and render durations over the last
/// `TIMING_WINDOW_LEN` frames.
#[derive(Debug, Default)]
pub(crate) struct StageTimings {
    update: RollingWindowMs,
    render: RollingWindowMs,
}

impl StageTimings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, update: Duration, render: Duration) {
        self.update.push_ms(duration_to_ms(update));
        self.render.push_ms(duration_to_ms(render));
    }

    pub(crate) fn snapshot(&self) -> StageTimingsSnapshot {
        StageTimingsSnapshot {
            update: self.update.snapshot(),
            render: self.render.snapshot(),
        }
    }
}

#[derive(Debug)]
struct RollingWindowMs {
    samples_ms: [f32; TIMING_WINDOW_LEN],
    head: usize,
    count: usize,
    sum_ms: f32,
    last_ms: f32,
}

impl Default for RollingWindowMs {
    fn default() -> Self {
        Self {
            samples_ms: [0.0; TIMING_WINDOW_LEN],
            head: 0,
            count: 0,
            sum_ms: 0.0,
            last_ms: 0.0,
        }
    }
}

impl RollingWindowMs {
    fn push_ms(&mut self, value_ms: f32) {
        self.last_ms = value_ms;
        let evicted = if self.count < TIMING_WINDOW_LEN {
            self.count += 1;
            0.0
        } else {
            self.samples_ms[self.head]
        };
        self.samples_ms[self.head] = value_ms;
        self.head = (self.head + 1) % TIMING_WINDOW_LEN;
        self.sum_ms += value_ms - evicted;
    }

    fn snapshot(&self) -> RollingMsStats {
        if self.count == 0 {
            return RollingMsStats::default();
        }
        let max_ms = self.samples_ms[..self.count]
            .iter()
            .copied()
            .fold(f32::MIN, f32::max);
        RollingMsStats {
            last_ms: self.last_ms,
            avg_ms: self.sum_ms / self.count as f32,
            max_ms,
        }
    }
}

fn duration_to_ms(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}

/// Stage marks of one frame, each measured from the frame start.
#[derive(Debug, Clone)]
pub struct ProfileFrame {
    started: Instant,
    samples: Vec<(&'static str, Duration)>,
}

impl ProfileFrame {
    pub fn begin(started: Instant) -> Self {
        Self {
            started,
            samples: Vec::with_capacity(8),
        }
    }

    pub fn tick(&mut self, stage: &'static str) {
        self.tick_at(stage, Instant::now());
    }

    pub fn tick_at(&mut self, stage: &'static str, at: Instant) {
        self.samples
            .push((stage, at.saturating_duration_since(self.started)));
    }

    pub fn samples(&self) -> &[(&'static str, Duration)] {
        &self.samples
    }

    pub fn total(&self) -> Duration {
        self.samples
            .last()
            .map(|(_, elapsed)| *elapsed)
            .unwrap_or(Duration::ZERO)
    }

    /// Time spent in each stage, i.e. the gap since the previous mark.
    pub fn stage_durations(&self) -> Vec<(&'static str, Duration)> {
        let mut previous = Duration::ZERO;
        self.samples
            .iter()
            .map(|(stage, elapsed)| {
                let spent = elapsed.saturating_sub(previous);
                previous = *elapsed;
                (*stage, spent)
            })
            .collect()
    }
}

/// Bounded history of finished profile frames, readable from any thread.
#[derive(Debug, Clone)]
pub struct ProfileHandle {
    frames: Arc<Mutex<VecDeque<ProfileFrame>>>,
    capacity: usize,
}

impl Default for ProfileHandle {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PROFILE_HISTORY)
    }
}

impl ProfileHandle {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub(crate) fn publish(&self, frame: ProfileFrame) {
        let mut frames = self.frames.lock();
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<ProfileFrame> {
        self.frames.lock().back().cloned()
    }

    /// Mean time per stage across the retained history, in first-seen order.
    pub fn stage_averages(&self) -> Vec<(&'static str, Duration)> {
        let frames = self.frames.lock();
        let mut totals: Vec<(&'static str, Duration, u32)> = Vec::new();
        for frame in frames.iter() {
            for (stage, spent) in frame.stage_durations() {
                match totals.iter_mut().find(|(name, _, _)| *name == stage) {
                    Some(entry) => {
                        entry.1 += spent;
                        entry.2 += 1;
                    }
                    None => totals.push((stage, spent, 1)),
                }
            }
        }
        totals
            .into_iter()
            .map(|(stage, total, count)| (stage, total / count))
            .collect()
    }
}
