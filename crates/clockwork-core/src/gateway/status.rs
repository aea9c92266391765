//! Status record published for status bars after every tick.
//!
//! The record always describes the single most relevant machine:
//! an active pomodoro, then a running countdown, then an active stopwatch,
//! and otherwise the clock.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format;
use crate::storage::{remove_if_exists, replace_file, Settings};
use crate::timer::{PomodoroMode, PomodoroState, StopwatchState, TimerEngine};

const PAUSED_SUFFIX: &str = " ||";

/// Styling class of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    #[serde(rename = "clock")]
    Clock,
    #[serde(rename = "pomodoro-work")]
    PomodoroWork,
    #[serde(rename = "pomodoro-short_break")]
    PomodoroShortBreak,
    #[serde(rename = "pomodoro-long_break")]
    PomodoroLongBreak,
    #[serde(rename = "timer")]
    Timer,
    #[serde(rename = "stopwatch")]
    Stopwatch,
}

impl StatusClass {
    fn for_mode(mode: PomodoroMode) -> Self {
        match mode {
            PomodoroMode::Work | PomodoroMode::Custom => StatusClass::PomodoroWork,
            PomodoroMode::ShortBreak => StatusClass::PomodoroShortBreak,
            PomodoroMode::LongBreak => StatusClass::PomodoroLongBreak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub text: String,
    pub tooltip: String,
    pub class: StatusClass,
    pub alt: String,
    /// 0-100.
    pub percentage: u8,
}

fn percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0) as u8
}

impl StatusRecord {
    /// Describe the highest priority active machine.
    pub fn compose(
        engine: &TimerEngine,
        settings: &Settings,
        wall_now: &DateTime<FixedOffset>,
        now: Instant,
    ) -> Self {
        let pomodoro = engine.pomodoro();
        let countdown = engine.countdown();
        let stopwatch = engine.stopwatch();

        if pomodoro.is_active() {
            let mode = pomodoro.mode();
            let icon = if mode.is_focus() { "🍅" } else { "☕" };
            let pct = percent(pomodoro.progress());
            let time = format::countdown(pomodoro.remaining_secs());
            let paused = pomodoro.state() == PomodoroState::Paused;
            return Self {
                text: if paused {
                    format!("{icon} {time}{PAUSED_SUFFIX}")
                } else {
                    format!("{icon} {time}")
                },
                tooltip: if paused {
                    format!("Pomodoro Paused: {} ({pct}%)", mode.as_str())
                } else {
                    format!("Pomodoro: {} ({pct}%)", mode.as_str())
                },
                class: StatusClass::for_mode(mode),
                alt: (if paused { "pomodoro-paused" } else { "pomodoro" }).into(),
                percentage: pct,
            };
        }

        if countdown.is_running() {
            let pct = percent(countdown.progress());
            return Self {
                text: format!("⏳ {}", format::countdown(countdown.remaining_secs())),
                tooltip: format!("Timer ({pct}%)"),
                class: StatusClass::Timer,
                alt: "timer".into(),
                percentage: pct,
            };
        }

        if stopwatch.is_active() {
            let full = format::stopwatch(stopwatch.elapsed(now));
            let time = full.split('.').next().unwrap_or(&full);
            let laps = stopwatch.laps().len();
            let paused = stopwatch.state() == StopwatchState::Paused;
            return Self {
                text: if paused {
                    format!("⏱ {time}{PAUSED_SUFFIX}")
                } else {
                    format!("⏱ {time}")
                },
                tooltip: if paused {
                    format!("Stopwatch Paused - {laps} laps")
                } else {
                    format!("Stopwatch - {laps} laps")
                },
                class: StatusClass::Stopwatch,
                alt: (if paused { "stopwatch-paused" } else { "stopwatch" }).into(),
                percentage: 0,
            };
        }

        Self {
            text: format!(
                "🕐 {}",
                format::clock_time(wall_now, settings.format_24h, settings.show_seconds)
            ),
            tooltip: format::long_date(wall_now),
            class: StatusClass::Clock,
            alt: "clock".into(),
            percentage: 0,
        }
    }
}

/// Writes status records to the status file.
///
/// Records identical to the last one written are skipped while the file is
/// still there, so an idle clock without seconds rewrites once a minute.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    path: PathBuf,
    last: Option<Vec<u8>>,
}

impl StatusPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `record`, returning whether the file was touched.
    pub fn publish(&mut self, record: &StatusRecord) -> Result<bool> {
        let json = serde_json::to_vec(record)?;
        if self.last.as_deref() == Some(json.as_slice()) && self.path.exists() {
            return Ok(false);
        }
        if self.last.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }
        replace_file(&self.path, &json)?;
        self.last = Some(json);
        Ok(true)
    }

    /// Remove the status file; its absence means "not running".
    pub fn clear(&mut self) -> Result<()> {
        self.last = None;
        remove_if_exists(&self.path)?;
        Ok(())
    }

    /// Read a published record, `None` when absent or unreadable.
    pub fn read(path: &Path) -> Option<StatusRecord> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn wall() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 14, 5, 9)
            .unwrap()
    }

    #[test]
    fn idle_engine_shows_the_clock() {
        let settings = Settings {
            format_24h: true,
            show_seconds: false,
            ..Settings::default()
        };
        let engine = TimerEngine::new(&settings);
        let record = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());
        assert_eq!(record.text, "🕐 14:05");
        assert_eq!(record.tooltip, "Monday, 15 January 2024");
        assert_eq!(record.class, StatusClass::Clock);
        assert_eq!(record.percentage, 0);
    }

    #[test]
    fn running_pomodoro_reports_progress() {
        let mut settings = Settings::default();
        let mut engine = TimerEngine::new(&settings);
        engine.toggle_pomodoro();
        engine.tick(750.0, &mut settings);

        let record = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());
        assert_eq!(record.text, "🍅 12:30");
        assert_eq!(record.tooltip, "Pomodoro: work (50%)");
        assert_eq!(record.alt, "pomodoro");
        assert_eq!(record.percentage, 50);
    }

    #[test]
    fn paused_pomodoro_outranks_running_stopwatch() {
        let settings = Settings::default();
        let now = Instant::now();
        let mut engine = TimerEngine::new(&settings);
        engine.set_pomodoro_mode(PomodoroMode::ShortBreak, &settings);
        engine.toggle_pomodoro();
        engine.toggle_pomodoro();
        engine.toggle_stopwatch(now).unwrap();

        let record = StatusRecord::compose(&engine, &settings, &wall(), now + Duration::from_secs(3));
        assert_eq!(record.class, StatusClass::PomodoroShortBreak);
        assert_eq!(record.alt, "pomodoro-paused");
        assert_eq!(record.text, "☕ 05:00 ||");
    }

    #[test]
    fn countdown_outranks_stopwatch() {
        let mut settings = Settings::default();
        let now = Instant::now();
        let mut engine = TimerEngine::new(&settings);
        engine.toggle_stopwatch(now).unwrap();
        engine.start_countdown(2.0).unwrap();
        engine.tick(30.0, &mut settings);

        let record = StatusRecord::compose(&engine, &settings, &wall(), now);
        assert_eq!(record.class, StatusClass::Timer);
        assert_eq!(record.text, "⏳ 01:30");
        assert_eq!(record.percentage, 25);
    }

    #[test]
    fn stopwatch_text_drops_centiseconds() {
        let settings = Settings::default();
        let now = Instant::now();
        let mut engine = TimerEngine::new(&settings);
        engine.toggle_stopwatch(now).unwrap();
        engine.record_lap(now + Duration::from_secs(5));

        let later = now + Duration::from_millis(65_500);
        let record = StatusRecord::compose(&engine, &settings, &wall(), later);
        assert_eq!(record.text, "⏱ 01:05");
        assert_eq!(record.tooltip, "Stopwatch - 1 laps");

        engine.toggle_stopwatch(later).unwrap();
        let record = StatusRecord::compose(&engine, &settings, &wall(), later);
        assert_eq!(record.alt, "stopwatch-paused");
        assert!(record.text.ends_with(" ||"));
    }

    #[test]
    fn class_names_match_the_wire_format() {
        let record = StatusRecord {
            text: String::new(),
            tooltip: String::new(),
            class: StatusClass::PomodoroLongBreak,
            alt: "pomodoro".into(),
            percentage: 7,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["class"], "pomodoro-long_break");
        assert_eq!(json["percentage"], 7);
    }

    #[test]
    fn publish_read_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut publisher = StatusPublisher::new(dir.path().join("run").join("status.json"));
        let settings = Settings::default();
        let engine = TimerEngine::new(&settings);
        let record = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());

        assert!(publisher.publish(&record).unwrap());
        assert_eq!(StatusPublisher::read(publisher.path()), Some(record));

        publisher.clear().unwrap();
        assert!(StatusPublisher::read(publisher.path()).is_none());
        publisher.clear().unwrap();
    }

    #[test]
    fn unchanged_record_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let mut publisher = StatusPublisher::new(&path);
        let mut settings = Settings::default();
        let mut engine = TimerEngine::new(&settings);
        let idle = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());

        assert!(publisher.publish(&idle).unwrap());
        std::fs::write(&path, "sentinel").unwrap();
        assert!(!publisher.publish(&idle).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "sentinel");

        engine.start_countdown(1.0).unwrap();
        engine.tick(1.0, &mut settings);
        let running = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());
        assert!(publisher.publish(&running).unwrap());
        assert_eq!(StatusPublisher::read(&path), Some(running));
    }

    #[test]
    fn removed_file_is_republished() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let mut publisher = StatusPublisher::new(&path);
        let settings = Settings::default();
        let engine = TimerEngine::new(&settings);
        let record = StatusRecord::compose(&engine, &settings, &wall(), Instant::now());

        publisher.publish(&record).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(publisher.publish(&record).unwrap());
        assert_eq!(StatusPublisher::read(&path), Some(record));
    }
}
