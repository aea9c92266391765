use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::Notice;
use crate::timer::{Lap, PomodoroMode};

/// Every state change in the engine produces an Event.
/// The daemon logs them and derives completion side effects from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PomodoroModeChanged {
        mode: PomodoroMode,
        total_secs: f64,
        at: DateTime<Utc>,
    },
    PomodoroStarted {
        mode: PomodoroMode,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    PomodoroPaused {
        mode: PomodoroMode,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    PomodoroResumed {
        mode: PomodoroMode,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    PomodoroReset {
        mode: PomodoroMode,
        total_secs: f64,
        at: DateTime<Utc>,
    },
    /// Remaining time of the pomodoro reached zero.
    PomodoroCompleted {
        mode: PomodoroMode,
        at: DateTime<Utc>,
    },
    /// A focus session was added to today's counters.
    FocusRecorded {
        sessions_today: u32,
        focus_minutes_today: u32,
        at: DateTime<Utc>,
    },
    TimerStarted {
        target_secs: f64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        target_secs: f64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StopwatchStarted {
        at: DateTime<Utc>,
    },
    StopwatchPaused {
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    StopwatchResumed {
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    LapRecorded {
        lap: Lap,
        at: DateTime<Utc>,
    },
    StopwatchReset {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Completions play the completion sound.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::PomodoroCompleted { .. } | Event::TimerCompleted { .. }
        )
    }

    /// The event changed persisted settings (daily counters).
    pub fn touches_settings(&self) -> bool {
        matches!(self, Event::FocusRecorded { .. })
    }

    /// Desktop notification requested by this event, if any.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Event::FocusRecorded { sessions_today, .. } => Some(Notice::new(
                "Focus Complete!",
                format!("Sessions today: {sessions_today}"),
            )),
            Event::PomodoroCompleted { mode, .. } if !mode.is_focus() => {
                Some(Notice::new("Break Over!", "Time to focus"))
            }
            Event::TimerCompleted { .. } => Some(Notice::new("Timer Complete!", "Time's up!")),
            _ => None,
        }
    }
}
