//! Tick scheduler: measures real elapsed time between ticks on the
//! monotonic clock.
//!
//! The nominal cadence is about 30 ticks per second, but nothing depends on
//! it. Each tick advances the engine by whatever time actually passed, so a
//! late tick or a system sleep simply produces a larger delta.

use std::time::{Duration, Instant};

use tokio::time::{Interval, MissedTickBehavior};

/// Nominal tick period.
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);
/// Signal-file poll period.
pub const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct TickScheduler {
    last_tick: Instant,
}

impl TickScheduler {
    pub fn new(now: Instant) -> Self {
        Self { last_tick: now }
    }

    /// Seconds since the previous call (or construction), never negative.
    pub fn delta(&mut self, now: Instant) -> f64 {
        let delta = now.saturating_duration_since(self.last_tick).as_secs_f64();
        if now > self.last_tick {
            self.last_tick = now;
        }
        delta
    }
}

/// A tokio interval that skips missed ticks instead of bursting to catch up.
/// Needs a running tokio runtime.
pub fn interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
