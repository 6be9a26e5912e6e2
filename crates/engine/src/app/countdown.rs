/// Duration of one server tick.
pub const TICK_SECONDS: f64 = 0.06;

/// Last server-reported progress of a countdown.
///
/// Replaced as a whole on every refresh so the render pass never sees a
/// percent from one sample paired with ticks from another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownState {
    pub percent_remaining: Option<u8>,
    pub tick_count: Option<u32>,
    pub sample_time_millis: u64,
}

impl CountdownState {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Builds a state from the wire encoding, where negative means unknown.
    pub fn from_wire(percent: i32, ticks: i32, sample_time_millis: u64) -> Self {
        Self {
            percent_remaining: (percent >= 0).then(|| percent.min(100) as u8),
            tick_count: u32::try_from(ticks).ok(),
            sample_time_millis,
        }
    }

    /// Remaining percentage projected to `now_millis`, never below zero.
    pub fn compute_remaining(&self, now_millis: u64) -> u8 {
        self.raw_remaining(now_millis).clamp(0, 100) as u8
    }

    /// Same projection without clamping; goes negative once the projected
    /// duration has run out before a fresh sample arrives.
    pub fn raw_remaining(&self, now_millis: u64) -> i64 {
        let Some(percent) = self.percent_remaining else {
            return 0;
        };
        let mut fraction = f64::from(percent) / 100.0;
        if let Some(ticks) = self.tick_count {
            let total_seconds = f64::from(ticks) * TICK_SECONDS;
            if total_seconds <= 0.0 {
                return 0;
            }
            let elapsed_seconds = elapsed_millis(self.sample_time_millis, now_millis) / 1000.0;
            fraction *= (total_seconds - elapsed_seconds) / total_seconds;
        }
        (fraction * 100.0).round() as i64
    }
}

fn elapsed_millis(sample_time_millis: u64, now_millis: u64) -> f64 {
    if now_millis >= sample_time_millis {
        (now_millis - sample_time_millis) as f64
    } else {
        -((sample_time_millis - now_millis) as f64)
    }
}
