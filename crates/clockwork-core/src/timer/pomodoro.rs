//! Pomodoro sub-machine.
//!
//! Delta-driven: the caller feeds elapsed seconds through `tick()`. The
//! sub-machine only reports the raw zero-crossing; what happens after a
//! completion (counters, next mode, auto-start) is decided by the engine.
//!
//! ```text
//! Stopped -> Running <-> Paused
//!               |
//!               v
//!            Stopped (completed)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{DurationError, Result};
use crate::events::Event;
use crate::storage::Settings;

/// Shortest accepted pomodoro duration in minutes.
pub const MIN_MINUTES: u32 = 1;
/// Longest accepted pomodoro duration in minutes.
pub const MAX_MINUTES: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroMode {
    Work,
    ShortBreak,
    LongBreak,
    /// Focus session with an explicit length instead of the configured one.
    Custom,
}

impl PomodoroMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
            Self::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Work => "WORK SESSION",
            Self::ShortBreak => "SHORT BREAK",
            Self::LongBreak => "LONG BREAK",
            Self::Custom => "CUSTOM SESSION",
        }
    }

    /// Work and custom sessions count towards the daily focus totals.
    pub fn is_focus(&self) -> bool {
        matches!(self, Self::Work | Self::Custom)
    }

    /// Configured length in minutes. `None` for custom sessions, whose
    /// length is chosen per session.
    pub fn configured_minutes(&self, settings: &Settings) -> Option<u32> {
        match self {
            Self::Work => Some(settings.work_duration),
            Self::ShortBreak => Some(settings.short_break),
            Self::LongBreak => Some(settings.long_break),
            Self::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroState {
    Stopped,
    Running,
    Paused,
}

impl PomodoroState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

/// Validate a pomodoro length in minutes (1-180 inclusive).
pub fn validate_minutes(minutes: i64) -> Result<u32, DurationError> {
    if minutes < MIN_MINUTES as i64 || minutes > MAX_MINUTES as i64 {
        return Err(DurationError::OutOfRange {
            minutes,
            min: MIN_MINUTES,
            max: MAX_MINUTES,
        });
    }
    Ok(minutes as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pomodoro {
    mode: PomodoroMode,
    state: PomodoroState,
    remaining_secs: f64,
    /// Length chosen when the mode was last set; progress denominator.
    total_secs: f64,
}

impl Pomodoro {
    /// A stopped work session at the configured work length.
    pub fn new(settings: &Settings) -> Self {
        let total = settings.work_duration as f64 * 60.0;
        Self {
            mode: PomodoroMode::Work,
            state: PomodoroState::Stopped,
            remaining_secs: total,
            total_secs: total,
        }
    }

    /// Rebuild from persisted parts, restoring `0 <= remaining <= total`.
    pub(crate) fn from_parts(
        mode: PomodoroMode,
        state: PomodoroState,
        remaining_secs: f64,
        total_secs: f64,
    ) -> Self {
        let total_secs = if total_secs.is_finite() && total_secs > 0.0 {
            total_secs
        } else {
            MIN_MINUTES as f64 * 60.0
        };
        let remaining_secs = if remaining_secs.is_finite() {
            remaining_secs.clamp(0.0, total_secs)
        } else {
            total_secs
        };
        Self {
            mode,
            state,
            remaining_secs,
            total_secs,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> PomodoroMode {
        self.mode
    }

    pub fn state(&self) -> PomodoroState {
        self.state
    }

    pub fn remaining_secs(&self) -> f64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Running or paused.
    pub fn is_active(&self) -> bool {
        self.state != PomodoroState::Stopped
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        ((self.total_secs - self.remaining_secs) / self.total_secs).clamp(0.0, 1.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Select a configured mode and stop at its full length.
    ///
    /// `Custom` keeps the current session length when already custom and
    /// otherwise starts from the configured work length; use
    /// [`Pomodoro::set_custom`] to choose a specific length.
    pub fn set_mode(&mut self, mode: PomodoroMode, settings: &Settings) -> Event {
        let total = match mode.configured_minutes(settings) {
            Some(minutes) => minutes as f64 * 60.0,
            None if self.mode == PomodoroMode::Custom => self.total_secs,
            None => settings.work_duration as f64 * 60.0,
        };
        self.apply(mode, total)
    }

    /// Start a custom-length session (stopped). Fails without touching
    /// state when `minutes` is outside 1-180.
    pub fn set_custom(&mut self, minutes: i64) -> Result<Event> {
        let minutes = validate_minutes(minutes)?;
        Ok(self.apply(PomodoroMode::Custom, minutes as f64 * 60.0))
    }

    pub fn toggle(&mut self) -> Event {
        match self.state {
            PomodoroState::Stopped => {
                self.state = PomodoroState::Running;
                Event::PomodoroStarted {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }
            }
            PomodoroState::Paused => {
                self.state = PomodoroState::Running;
                Event::PomodoroResumed {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }
            }
            PomodoroState::Running => {
                self.state = PomodoroState::Paused;
                Event::PomodoroPaused {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                }
            }
        }
    }

    /// Advance by `delta_secs`. Returns `Some(Event::PomodoroCompleted)` on
    /// the tick that reaches zero; the session is stopped afterwards, so
    /// later ticks cannot fire again.
    pub fn tick(&mut self, delta_secs: f64) -> Option<Event> {
        match self.state {
            PomodoroState::Running => {
                if !(delta_secs > 0.0) {
                    return None;
                }
                self.remaining_secs = (self.remaining_secs - delta_secs).max(0.0);
                if self.remaining_secs == 0.0 {
                    self.state = PomodoroState::Stopped;
                    return Some(Event::PomodoroCompleted {
                        mode: self.mode,
                        at: Utc::now(),
                    });
                }
                None
            }
            PomodoroState::Stopped | PomodoroState::Paused => None,
        }
    }

    pub fn reset(&mut self, settings: &Settings) -> Event {
        let total = match self.mode.configured_minutes(settings) {
            Some(minutes) => minutes as f64 * 60.0,
            None => self.total_secs,
        };
        self.mode_reset(total);
        Event::PomodoroReset {
            mode: self.mode,
            total_secs: self.total_secs,
            at: Utc::now(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply(&mut self, mode: PomodoroMode, total_secs: f64) -> Event {
        self.mode = mode;
        self.mode_reset(total_secs);
        Event::PomodoroModeChanged {
            mode,
            total_secs,
            at: Utc::now(),
        }
    }

    fn mode_reset(&mut self, total_secs: f64) {
        self.state = PomodoroState::Stopped;
        self.total_secs = total_secs;
        self.remaining_secs = total_secs;
    }
}
