//! Session snapshot: the in-flight state of all three sub-machines plus the
//! wall-clock time it was captured, persisted as JSON across restarts.
//!
//! Monotonic `Instant`s do not survive a restart, so the snapshot stores
//! plain seconds and the wall-clock capture time. Restoring adds the real
//! gap to running machines. A countdown whose time ran out while the
//! process was down is dropped and left stopped; its completion is not
//! replayed.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Settings;
use crate::timer::{
    Countdown, CountdownState, Lap, Pomodoro, PomodoroMode, PomodoroState, Stopwatch,
    StopwatchState, TimerEngine,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroSnapshot {
    pub mode: PomodoroMode,
    pub state: PomodoroState,
    pub remaining_secs: f64,
    pub total_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub state: CountdownState,
    pub remaining_secs: f64,
    pub target_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopwatchSnapshot {
    pub state: StopwatchState,
    pub elapsed_secs: f64,
    #[serde(default)]
    pub laps: Vec<Lap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub pomodoro: Option<PomodoroSnapshot>,
    #[serde(default)]
    pub countdown: Option<CountdownSnapshot>,
    #[serde(default)]
    pub stopwatch: Option<StopwatchSnapshot>,
}

impl SessionSnapshot {
    pub fn capture(engine: &TimerEngine, now: Instant, captured_at: DateTime<Utc>) -> Self {
        let p = engine.pomodoro();
        let c = engine.countdown();
        let s = engine.stopwatch();
        Self {
            captured_at,
            pomodoro: Some(PomodoroSnapshot {
                mode: p.mode(),
                state: p.state(),
                remaining_secs: p.remaining_secs(),
                total_secs: p.total_secs(),
            }),
            countdown: Some(CountdownSnapshot {
                state: c.state(),
                remaining_secs: c.remaining_secs(),
                target_secs: c.target_secs(),
            }),
            stopwatch: Some(StopwatchSnapshot {
                state: s.state(),
                elapsed_secs: s.elapsed(now),
                laps: s.laps().to_vec(),
            }),
        }
    }

    /// Seconds between capture and `wall_now`; never negative, so a clock
    /// set backwards cannot add time back.
    pub fn gap_secs(&self, wall_now: DateTime<Utc>) -> f64 {
        let gap = wall_now.signed_duration_since(self.captured_at);
        (gap.num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// Rebuild an engine, reconciling running machines with the time that
    /// passed since capture.
    pub fn restore(&self, settings: &Settings, now: Instant, wall_now: DateTime<Utc>) -> TimerEngine {
        let gap = self.gap_secs(wall_now);

        let pomodoro = match &self.pomodoro {
            Some(snap) if snap.state == PomodoroState::Running => {
                let remaining = snap.remaining_secs - gap;
                if remaining > 0.0 {
                    Pomodoro::from_parts(snap.mode, snap.state, remaining, snap.total_secs)
                } else {
                    tracing::info!(
                        mode = snap.mode.as_str(),
                        gap_secs = gap,
                        "pomodoro ran out while closed, discarding"
                    );
                    Pomodoro::new(settings)
                }
            }
            Some(snap) => {
                Pomodoro::from_parts(snap.mode, snap.state, snap.remaining_secs, snap.total_secs)
            }
            None => Pomodoro::new(settings),
        };

        let countdown = match &self.countdown {
            Some(snap) if snap.state == CountdownState::Running => {
                let remaining = snap.remaining_secs - gap;
                if remaining > 0.0 {
                    Countdown::from_parts(snap.state, remaining, snap.target_secs)
                } else {
                    tracing::info!(gap_secs = gap, "countdown ran out while closed, discarding");
                    Countdown::default()
                }
            }
            Some(snap) => Countdown::from_parts(snap.state, snap.remaining_secs, snap.target_secs),
            None => Countdown::default(),
        };

        let stopwatch = match &self.stopwatch {
            Some(snap) => {
                let elapsed = match snap.state {
                    StopwatchState::Running => snap.elapsed_secs + gap,
                    StopwatchState::Paused | StopwatchState::Stopped => snap.elapsed_secs,
                };
                Stopwatch::restore(snap.state, elapsed, snap.laps.clone(), now)
            }
            None => Stopwatch::default(),
        };

        TimerEngine::from_parts(pomodoro, countdown, stopwatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn running_pomodoro(remaining_secs: f64, captured_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            captured_at,
            pomodoro: Some(PomodoroSnapshot {
                mode: PomodoroMode::Work,
                state: PomodoroState::Running,
                remaining_secs,
                total_secs: 1500.0,
            }),
            countdown: None,
            stopwatch: None,
        }
    }

    #[test]
    fn running_pomodoro_loses_the_gap() {
        let wall = Utc::now();
        let snap = running_pomodoro(600.0, wall - Duration::seconds(100));
        let engine = snap.restore(&Settings::default(), Instant::now(), wall);
        assert_eq!(engine.pomodoro().state(), PomodoroState::Running);
        assert!((engine.pomodoro().remaining_secs() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn expired_pomodoro_is_discarded_as_stopped() {
        let wall = Utc::now();
        let snap = running_pomodoro(100.0, wall - Duration::seconds(150));
        let mut engine = snap.restore(&Settings::default(), Instant::now(), wall);
        assert_eq!(engine.pomodoro().state(), PomodoroState::Stopped);
        assert_eq!(engine.pomodoro().mode(), PomodoroMode::Work);
        assert!(engine.pomodoro().remaining_secs() > 0.0);

        let mut settings = Settings::default();
        assert!(engine.tick(1.0, &mut settings).is_empty());
        assert_eq!(settings.pomodoro_count, 0);
    }

    #[test]
    fn paused_pomodoro_is_restored_unchanged() {
        let wall = Utc::now();
        let mut snap = running_pomodoro(321.0, wall - Duration::hours(5));
        if let Some(p) = snap.pomodoro.as_mut() {
            p.state = PomodoroState::Paused;
            p.mode = PomodoroMode::LongBreak;
        }
        let engine = snap.restore(&Settings::default(), Instant::now(), wall);
        assert_eq!(engine.pomodoro().state(), PomodoroState::Paused);
        assert_eq!(engine.pomodoro().mode(), PomodoroMode::LongBreak);
        assert_eq!(engine.pomodoro().remaining_secs(), 321.0);
    }

    #[test]
    fn expired_countdown_is_discarded() {
        let wall = Utc::now();
        let snap = SessionSnapshot {
            captured_at: wall - Duration::seconds(61),
            pomodoro: None,
            countdown: Some(CountdownSnapshot {
                state: CountdownState::Running,
                remaining_secs: 60.0,
                target_secs: 600.0,
            }),
            stopwatch: None,
        };
        let engine = snap.restore(&Settings::default(), Instant::now(), wall);
        assert_eq!(engine.countdown().state(), CountdownState::Stopped);
        assert_eq!(engine.countdown().target_secs(), 0.0);
    }

    #[test]
    fn running_stopwatch_gains_the_gap() {
        let wall = Utc::now();
        let now = Instant::now();
        let snap = SessionSnapshot {
            captured_at: wall - Duration::seconds(30),
            pomodoro: None,
            countdown: None,
            stopwatch: Some(StopwatchSnapshot {
                state: StopwatchState::Running,
                elapsed_secs: 12.0,
                laps: vec![Lap {
                    number: 1,
                    split_secs: 5.0,
                    cumulative_secs: 5.0,
                }],
            }),
        };
        let engine = snap.restore(&Settings::default(), now, wall);
        let elapsed = engine.stopwatch().elapsed(now + StdDuration::from_secs(2));
        assert!((elapsed - 44.0).abs() < 1e-6);
        assert_eq!(engine.stopwatch().laps().len(), 1);
    }

    #[test]
    fn backwards_clock_adds_no_time() {
        let wall = Utc::now();
        let snap = running_pomodoro(600.0, wall + Duration::seconds(90));
        assert_eq!(snap.gap_secs(wall), 0.0);
    }

    #[test]
    fn capture_then_restore_keeps_state() {
        let settings = Settings::default();
        let now = Instant::now();
        let wall = Utc::now();
        let mut engine = TimerEngine::new(&settings);
        engine.set_pomodoro_mode(PomodoroMode::ShortBreak, &settings);
        engine.start_countdown(2.0).unwrap();
        engine.toggle_stopwatch(now).unwrap();
        engine
            .toggle_stopwatch(now + StdDuration::from_secs(4))
            .unwrap();

        let snap = SessionSnapshot::capture(&engine, now + StdDuration::from_secs(9), wall);
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: SessionSnapshot = serde_json::from_str(&json).unwrap();
        let restored = parsed.restore(&settings, now, wall);

        assert_eq!(restored.pomodoro().mode(), PomodoroMode::ShortBreak);
        assert_eq!(restored.countdown().remaining_secs(), 120.0);
        assert_eq!(restored.stopwatch().state(), StopwatchState::Paused);
        assert!((restored.stopwatch().elapsed(now) - 4.0).abs() < 1e-6);
    }
}
