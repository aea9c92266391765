//! Stopwatch sub-machine.
//!
//! Unlike the countdowns, the stopwatch is formula-driven: elapsed time is
//! derived from a monotonic start reference plus the sum of earlier run
//! segments, so it never accumulates tick rounding. Every time-dependent
//! operation takes the current `Instant` explicitly.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Stopped,
    Running,
    Paused,
}

impl StopwatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// 1-based.
    pub number: u32,
    /// Time since the previous lap (or since start for the first lap).
    pub split_secs: f64,
    pub cumulative_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LapClass {
    Best,
    Worst,
    Normal,
}

/// Tag the fastest split(s) best and the slowest worst across all laps.
///
/// Ties share the tag. When every split is equal (including a single lap)
/// all laps are normal.
pub fn classify_laps(laps: &[Lap]) -> Vec<LapClass> {
    let min = laps.iter().map(|l| l.split_secs).fold(f64::INFINITY, f64::min);
    let max = laps
        .iter()
        .map(|l| l.split_secs)
        .fold(f64::NEG_INFINITY, f64::max);

    laps.iter()
        .map(|lap| {
            if min == max {
                LapClass::Normal
            } else if lap.split_secs == min {
                LapClass::Best
            } else if lap.split_secs == max {
                LapClass::Worst
            } else {
                LapClass::Normal
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Stopwatch {
    state: StopwatchState,
    /// Set only while running.
    started_at: Option<Instant>,
    /// Sum of completed run segments, in seconds.
    offset_secs: f64,
    laps: Vec<Lap>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self {
            state: StopwatchState::Stopped,
            started_at: None,
            offset_secs: 0.0,
            laps: Vec::new(),
        }
    }
}

impl Stopwatch {
    /// Rebuild from a persisted elapsed value. A running stopwatch resumes
    /// counting from `now`.
    pub(crate) fn restore(
        state: StopwatchState,
        elapsed_secs: f64,
        laps: Vec<Lap>,
        now: Instant,
    ) -> Self {
        let offset_secs = if elapsed_secs.is_finite() {
            elapsed_secs.max(0.0)
        } else {
            0.0
        };
        match state {
            StopwatchState::Stopped => Self::default(),
            StopwatchState::Running => Self {
                state,
                started_at: Some(now),
                offset_secs,
                laps,
            },
            StopwatchState::Paused => Self {
                state,
                started_at: None,
                offset_secs,
                laps,
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != StopwatchState::Stopped
    }

    pub fn elapsed(&self, now: Instant) -> f64 {
        match (self.state, self.started_at) {
            (StopwatchState::Running, Some(start)) => {
                self.offset_secs + now.saturating_duration_since(start).as_secs_f64()
            }
            (StopwatchState::Running, None) | (StopwatchState::Paused, _) => self.offset_secs,
            (StopwatchState::Stopped, _) => 0.0,
        }
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Laps paired with their best/worst classification.
    pub fn classified_laps(&self) -> Vec<(&Lap, LapClass)> {
        self.laps.iter().zip(classify_laps(&self.laps)).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: Instant) -> Result<Event> {
        match self.state {
            StopwatchState::Stopped => {
                self.state = StopwatchState::Running;
                self.started_at = Some(now);
                self.offset_secs = 0.0;
                self.laps.clear();
                Ok(Event::StopwatchStarted { at: Utc::now() })
            }
            StopwatchState::Running | StopwatchState::Paused => Err(self.rejected("start")),
        }
    }

    pub fn pause(&mut self, now: Instant) -> Result<Event> {
        match self.state {
            StopwatchState::Running => {
                self.offset_secs = self.elapsed(now);
                self.started_at = None;
                self.state = StopwatchState::Paused;
                Ok(Event::StopwatchPaused {
                    elapsed_secs: self.offset_secs,
                    at: Utc::now(),
                })
            }
            StopwatchState::Stopped | StopwatchState::Paused => Err(self.rejected("pause")),
        }
    }

    pub fn resume(&mut self, now: Instant) -> Result<Event> {
        match self.state {
            StopwatchState::Paused => {
                self.started_at = Some(now);
                self.state = StopwatchState::Running;
                Ok(Event::StopwatchResumed {
                    elapsed_secs: self.offset_secs,
                    at: Utc::now(),
                })
            }
            StopwatchState::Stopped | StopwatchState::Running => Err(self.rejected("resume")),
        }
    }

    /// Start, pause or resume depending on the current state.
    pub fn toggle(&mut self, now: Instant) -> Result<Event> {
        match self.state {
            StopwatchState::Stopped => self.start(now),
            StopwatchState::Running => self.pause(now),
            StopwatchState::Paused => self.resume(now),
        }
    }

    /// Append a lap. No-op (returns `None`) while nothing has elapsed.
    pub fn record_lap(&mut self, now: Instant) -> Option<Event> {
        let elapsed = self.elapsed(now);
        if elapsed <= 0.0 {
            return None;
        }
        let (number, previous) = self
            .laps
            .last()
            .map(|l| (l.number + 1, l.cumulative_secs))
            .unwrap_or((1, 0.0));
        let lap = Lap {
            number,
            split_secs: (elapsed - previous).max(0.0),
            cumulative_secs: elapsed,
        };
        self.laps.push(lap.clone());
        Some(Event::LapRecorded {
            lap,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Event {
        *self = Self::default();
        Event::StopwatchReset { at: Utc::now() }
    }

    fn rejected(&self, operation: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            machine: "stopwatch",
            operation,
            state: self.state.as_str(),
        }
    }
}
