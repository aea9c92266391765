//! Timer engine implementation.
//!
//! The engine owns the three sub-machines and is the only place they are
//! mutated. It does not use internal threads or read the clock itself: the
//! caller supplies the tick delta and the current `Instant`, and passes the
//! settings explicitly into every operation that depends on them.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(&settings);
//! engine.toggle_pomodoro();
//! // In a loop:
//! let events = engine.tick(delta_secs, &mut settings);
//! ```

use std::time::Instant;

use chrono::Utc;

use super::countdown::Countdown;
use super::pomodoro::{Pomodoro, PomodoroMode, PomodoroState};
use super::stopwatch::Stopwatch;
use crate::error::Result;
use crate::events::Event;
use crate::storage::Settings;

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    pomodoro: Pomodoro,
    countdown: Countdown,
    stopwatch: Stopwatch,
}

impl TimerEngine {
    /// Stopped work session, idle countdown and stopwatch.
    pub fn new(settings: &Settings) -> Self {
        Self {
            pomodoro: Pomodoro::new(settings),
            countdown: Countdown::default(),
            stopwatch: Stopwatch::default(),
        }
    }

    pub(crate) fn from_parts(pomodoro: Pomodoro, countdown: Countdown, stopwatch: Stopwatch) -> Self {
        Self {
            pomodoro,
            countdown,
            stopwatch,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn pomodoro(&self) -> &Pomodoro {
        &self.pomodoro
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    // ── Pomodoro ─────────────────────────────────────────────────────

    pub fn set_pomodoro_mode(&mut self, mode: PomodoroMode, settings: &Settings) -> Event {
        self.pomodoro.set_mode(mode, settings)
    }

    pub fn set_custom_pomodoro(&mut self, minutes: i64) -> Result<Event> {
        self.pomodoro.set_custom(minutes)
    }

    pub fn toggle_pomodoro(&mut self) -> Event {
        self.pomodoro.toggle()
    }

    pub fn reset_pomodoro(&mut self, settings: &Settings) -> Event {
        self.pomodoro.reset(settings)
    }

    /// Re-apply the configured length after a settings edit, but only while
    /// the pomodoro is stopped in a configured mode.
    pub fn apply_settings(&mut self, settings: &Settings) -> Option<Event> {
        let stopped = self.pomodoro.state() == PomodoroState::Stopped;
        let minutes = self.pomodoro.mode().configured_minutes(settings)?;
        if stopped && self.pomodoro.total_secs() != minutes as f64 * 60.0 {
            return Some(self.pomodoro.set_mode(self.pomodoro.mode(), settings));
        }
        None
    }

    // ── Countdown ────────────────────────────────────────────────────

    pub fn start_countdown(&mut self, minutes: f64) -> Result<Event> {
        self.countdown.start(minutes)
    }

    pub fn toggle_countdown(&mut self, minutes: f64) -> Result<Event> {
        self.countdown.toggle(minutes)
    }

    pub fn reset_countdown(&mut self) -> Event {
        self.countdown.reset()
    }

    // ── Stopwatch ────────────────────────────────────────────────────

    pub fn toggle_stopwatch(&mut self, now: Instant) -> Result<Event> {
        self.stopwatch.toggle(now)
    }

    pub fn record_lap(&mut self, now: Instant) -> Option<Event> {
        self.stopwatch.record_lap(now)
    }

    pub fn reset_stopwatch(&mut self) -> Event {
        self.stopwatch.reset()
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance the countdown-type machines by `delta_secs`.
    ///
    /// A pomodoro completion applies the completion policy in place and may
    /// bump the daily counters in `settings`; the returned
    /// `Event::FocusRecorded` tells the caller to persist them.
    pub fn tick(&mut self, delta_secs: f64, settings: &mut Settings) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(done) = self.pomodoro.tick(delta_secs) {
            let mode = self.pomodoro.mode();
            events.push(done);
            self.complete_pomodoro(mode, settings, &mut events);
        }

        if let Some(done) = self.countdown.tick(delta_secs) {
            events.push(done);
        }

        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_pomodoro(&mut self, mode: PomodoroMode, settings: &mut Settings, events: &mut Vec<Event>) {
        if !mode.is_focus() {
            events.push(self.pomodoro.set_mode(PomodoroMode::Work, settings));
            return;
        }

        let minutes = match mode.configured_minutes(settings) {
            Some(minutes) => minutes,
            None => (self.pomodoro.total_secs() / 60.0).round() as u32,
        };
        settings.pomodoro_count = settings.pomodoro_count.saturating_add(1);
        settings.daily_focus_minutes = settings.daily_focus_minutes.saturating_add(minutes);
        events.push(Event::FocusRecorded {
            sessions_today: settings.pomodoro_count,
            focus_minutes_today: settings.daily_focus_minutes,
            at: Utc::now(),
        });

        let next = if settings.pomodoro_count % settings.long_break_interval.max(1) == 0 {
            PomodoroMode::LongBreak
        } else {
            PomodoroMode::ShortBreak
        };

        if settings.auto_start_breaks {
            events.push(self.pomodoro.set_mode(next, settings));
            events.push(self.pomodoro.toggle());
        } else {
            events.push(self.pomodoro.set_mode(PomodoroMode::ShortBreak, settings));
        }
    }
}
