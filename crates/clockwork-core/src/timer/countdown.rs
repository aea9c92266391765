//! Countdown timer sub-machine: `Stopped <-> Running`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DurationError, Result};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Stopped,
    Running,
}

impl CountdownState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    state: CountdownState,
    remaining_secs: f64,
    /// Length set at start; progress denominator.
    target_secs: f64,
}

impl Default for Countdown {
    fn default() -> Self {
        Self {
            state: CountdownState::Stopped,
            remaining_secs: 0.0,
            target_secs: 0.0,
        }
    }
}

impl Countdown {
    pub(crate) fn from_parts(state: CountdownState, remaining_secs: f64, target_secs: f64) -> Self {
        let finite_or_zero = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let remaining_secs = finite_or_zero(remaining_secs);
        let target_secs = finite_or_zero(target_secs);
        Self {
            state,
            remaining_secs,
            target_secs: target_secs.max(remaining_secs),
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    pub fn target_secs(&self) -> f64 {
        self.target_secs
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    /// 0.0 .. 1.0 progress; 0 when no target is set. Pinned at 1.0 after a
    /// completion until the next start or reset.
    pub fn progress(&self) -> f64 {
        if self.target_secs <= 0.0 {
            return 0.0;
        }
        ((self.target_secs - self.remaining_secs) / self.target_secs).clamp(0.0, 1.0)
    }

    /// Start a fresh countdown of `minutes` (may be fractional).
    pub fn start(&mut self, minutes: f64) -> Result<Event> {
        if !(minutes > 0.0) || !minutes.is_finite() {
            return Err(DurationError::NotPositive { minutes }.into());
        }
        let target = minutes * 60.0;
        self.state = CountdownState::Running;
        self.remaining_secs = target;
        self.target_secs = target;
        Ok(Event::TimerStarted {
            target_secs: target,
            at: Utc::now(),
        })
    }

    /// Manual cancel; no completion side effects.
    pub fn stop(&mut self) -> Result<Event> {
        match self.state {
            CountdownState::Running => {
                self.state = CountdownState::Stopped;
                Ok(Event::TimerStopped {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            CountdownState::Stopped => Err(CoreError::InvalidTransition {
                machine: "timer",
                operation: "stop",
                state: self.state.as_str(),
            }),
        }
    }

    /// Stop when running, otherwise start a new countdown of `minutes`.
    pub fn toggle(&mut self, minutes: f64) -> Result<Event> {
        match self.state {
            CountdownState::Running => self.stop(),
            CountdownState::Stopped => self.start(minutes),
        }
    }

    pub fn tick(&mut self, delta_secs: f64) -> Option<Event> {
        match self.state {
            CountdownState::Running => {
                if !(delta_secs > 0.0) {
                    return None;
                }
                self.remaining_secs = (self.remaining_secs - delta_secs).max(0.0);
                if self.remaining_secs == 0.0 {
                    self.state = CountdownState::Stopped;
                    return Some(Event::TimerCompleted {
                        target_secs: self.target_secs,
                        at: Utc::now(),
                    });
                }
                None
            }
            CountdownState::Stopped => None,
        }
    }

    pub fn reset(&mut self) -> Event {
        *self = Self::default();
        Event::TimerReset { at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_sets_target_and_runs() {
        let mut c = Countdown::default();
        c.start(10.0).unwrap();
        assert!(c.is_running());
        assert_eq!(c.remaining_secs(), 600.0);
        assert_eq!(c.target_secs(), 600.0);
        assert_eq!(c.progress(), 0.0);
    }

    #[test]
    fn start_rejects_non_positive_minutes() {
        let mut c = Countdown::default();
        assert!(matches!(
            c.start(0.0),
            Err(CoreError::InvalidDuration(DurationError::NotPositive { .. }))
        ));
        assert!(c.start(-2.5).is_err());
        assert!(c.start(f64::NAN).is_err());
        assert_eq!(c, Countdown::default());
    }

    #[test]
    fn completion_pins_progress_at_full() {
        let mut c = Countdown::default();
        c.start(0.5).unwrap();
        assert!(c.tick(10.0).is_none());
        let event = c.tick(100.0);
        assert!(matches!(event, Some(Event::TimerCompleted { .. })));
        assert_eq!(c.state(), CountdownState::Stopped);
        assert_eq!(c.remaining_secs(), 0.0);
        assert_eq!(c.progress(), 1.0);
        assert!(c.tick(1.0).is_none());
    }

    #[test]
    fn stop_is_manual_cancel() {
        let mut c = Countdown::default();
        c.start(1.0).unwrap();
        c.tick(15.0);
        assert!(matches!(c.stop(), Ok(Event::TimerStopped { .. })));
        assert_eq!(c.remaining_secs(), 45.0);
        assert!(c.tick(100.0).is_none());
    }

    #[test]
    fn stop_from_stopped_is_rejected() {
        let mut c = Countdown::default();
        assert!(matches!(
            c.stop(),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn toggle_alternates_start_and_stop() {
        let mut c = Countdown::default();
        assert!(matches!(c.toggle(3.0), Ok(Event::TimerStarted { .. })));
        assert!(matches!(c.toggle(3.0), Ok(Event::TimerStopped { .. })));
        assert!(matches!(c.toggle(3.0), Ok(Event::TimerStarted { .. })));
        assert_eq!(c.remaining_secs(), 180.0);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut c = Countdown::default();
        c.start(5.0).unwrap();
        c.tick(30.0);
        c.reset();
        assert_eq!(c, Countdown::default());
        assert_eq!(c.progress(), 0.0);
    }
}
