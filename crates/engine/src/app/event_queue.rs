use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam::queue::SegQueue;

use super::InputEvent;

/// Lock-free FIFO between host callback threads and the loop thread.
///
/// Any thread may enqueue; only the loop thread drains.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: SegQueue<InputEvent>,
    last_activity_millis: AtomicU64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, event: InputEvent) {
        self.events.push(event);
    }

    /// Removes and returns every event available right now, oldest first.
    /// Events pushed while draining are left for the next call.
    pub fn drain_all(&self) -> Vec<InputEvent> {
        self.drain_up_to(self.events.len())
    }

    fn drain_up_to(&self, limit: usize) -> Vec<InputEvent> {
        let mut drained = Vec::with_capacity(limit);
        while drained.len() < limit {
            let Some(event) = self.events.pop() else {
                break;
            };
            drained.push(event);
        }
        if !drained.is_empty() {
            self.last_activity_millis
                .store(wall_clock_millis(), Ordering::Relaxed);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Wall-clock millis of the last drain that yielded events, 0 if none yet.
    pub fn last_activity_millis(&self) -> u64 {
        self.last_activity_millis.load(Ordering::Relaxed)
    }

    pub fn idle_for(&self, now_millis: u64) -> Option<Duration> {
        match self.last_activity_millis() {
            0 => None,
            last => Some(Duration::from_millis(now_millis.saturating_sub(last))),
        }
    }
}

pub fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
