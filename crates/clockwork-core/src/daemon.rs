//! The long-running engine host.
//!
//! One task owns all state. It ticks the engine on the scheduler cadence,
//! polls the signal file on a coarser cadence, and publishes the status
//! record after every tick. Ticks and polls never run concurrently.
//!
//! ```ignore
//! let store = SessionStore::open_default();
//! let daemon = Daemon::new(store, DaemonPaths::default(), Box::new(DesktopNotifier), Instant::now());
//! daemon.run().await;
//! ```

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;

use crate::clock::{self, Zone};
use crate::error::Result;
use crate::events::Event;
use crate::gateway::{Command, SignalChannel, StatusPublisher, StatusRecord};
use crate::notify::Notifier;
use crate::scheduler::{self, TickScheduler, SIGNAL_POLL_INTERVAL, TICK_INTERVAL};
use crate::storage::{default_signal_path, default_status_path, SessionSnapshot, SessionStore};
use crate::timer::{PomodoroMode, TimerEngine};

/// Locations of the control and status files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonPaths {
    pub signal: PathBuf,
    pub status: PathBuf,
}

impl Default for DaemonPaths {
    fn default() -> Self {
        Self {
            signal: default_signal_path(),
            status: default_status_path(),
        }
    }
}

pub struct Daemon {
    engine: TimerEngine,
    store: SessionStore,
    scheduler: TickScheduler,
    signal: SignalChannel,
    status: StatusPublisher,
    notifier: Box<dyn Notifier>,
    zone: Zone,
    visible: bool,
    /// Set after a failed status write so repeats are not logged every tick.
    status_failing: bool,
}

impl Daemon {
    /// Build a daemon around `store`, restoring the last saved session.
    pub fn new(store: SessionStore, paths: DaemonPaths, notifier: Box<dyn Notifier>, now: Instant) -> Self {
        let mut engine = match store.load_session() {
            Some(snapshot) => {
                tracing::info!(captured_at = %snapshot.captured_at, "restoring session");
                snapshot.restore(store.settings(), now, Utc::now())
            }
            None => TimerEngine::new(store.settings()),
        };
        engine.apply_settings(store.settings());
        let zone = Zone::resolve(&store.settings().timezone);

        Self {
            engine,
            store,
            scheduler: TickScheduler::new(now),
            signal: SignalChannel::new(paths.signal),
            status: StatusPublisher::new(paths.status),
            notifier,
            zone,
            visible: true,
            status_failing: false,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Zero yesterday's counters, advance the engine by the time since the
    /// previous tick, run completion side effects, and publish the status
    /// record.
    pub fn tick(&mut self, now: Instant) -> Vec<Event> {
        self.store.roll_over_day(clock::local_today());
        let delta = self.scheduler.delta(now);
        let events = self.engine.tick(delta, self.store.settings_mut());
        if !events.is_empty() {
            self.dispatch(&events, now);
        }
        self.publish_status(now);
        events
    }

    /// Pick up external settings edits, then consume and apply a pending
    /// signal. Failures are logged, never returned.
    pub fn poll_signal(&mut self, now: Instant) -> Vec<Event> {
        if self.store.reload_if_changed() {
            self.zone = Zone::resolve(&self.store.settings().timezone);
            if let Some(event) = self.engine.apply_settings(self.store.settings()) {
                tracing::debug!(?event, "re-applied settings");
            }
        }

        let command = match self.signal.poll() {
            Ok(Some(command)) => command,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring signal");
                return Vec::new();
            }
        };
        match self.apply(command, now) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(%command, error = %e, "command rejected");
                Vec::new()
            }
        }
    }

    /// Apply one control command and persist the resulting session.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<Vec<Event>> {
        let settings = self.store.settings();
        let events = match command {
            Command::PomoToggle => vec![self.engine.toggle_pomodoro()],
            Command::PomoWork => vec![self.engine.set_pomodoro_mode(PomodoroMode::Work, settings)],
            Command::PomoShort => {
                vec![self.engine.set_pomodoro_mode(PomodoroMode::ShortBreak, settings)]
            }
            Command::PomoLong => {
                vec![self.engine.set_pomodoro_mode(PomodoroMode::LongBreak, settings)]
            }
            Command::PomoReset => vec![self.engine.reset_pomodoro(settings)],
            Command::TimerToggle => {
                vec![self.engine.toggle_countdown(settings.timer_minutes as f64)?]
            }
            Command::TimerReset => vec![self.engine.reset_countdown()],
            Command::SwToggle => vec![self.engine.toggle_stopwatch(now)?],
            Command::SwLap => self.engine.record_lap(now).into_iter().collect(),
            Command::SwReset => vec![self.engine.reset_stopwatch()],
            Command::Show => {
                self.set_visible(true);
                Vec::new()
            }
            Command::ToggleVisibility => {
                self.set_visible(!self.visible);
                Vec::new()
            }
        };

        tracing::debug!(%command, events = events.len(), "applied command");
        self.save_session(now);
        self.publish_status(now);
        Ok(events)
    }

    pub fn save_session(&self, now: Instant) {
        let snapshot = SessionSnapshot::capture(&self.engine, now, Utc::now());
        self.store.save_session(&snapshot);
    }

    /// Persist the session and remove the runtime files.
    pub fn shutdown(&mut self, now: Instant) {
        self.save_session(now);
        if let Err(e) = self.status.clear() {
            tracing::warn!(error = %e, "could not remove status file");
        }
        if let Err(e) = self.signal.clear() {
            tracing::warn!(error = %e, "could not remove signal file");
        }
        tracing::info!("daemon stopped");
    }

    /// Drive the daemon until Ctrl-C or SIGTERM.
    pub async fn run(mut self) {
        let mut ticks = scheduler::interval(TICK_INTERVAL);
        let mut polls = scheduler::interval(SIGNAL_POLL_INTERVAL);
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        tracing::info!(
            signal = %self.signal.path().display(),
            status = %self.status.path().display(),
            "daemon running"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => {
                    self.tick(Instant::now());
                }
                _ = polls.tick() => {
                    self.poll_signal(Instant::now());
                }
            }
        }

        self.shutdown(Instant::now());
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, events: &[Event], now: Instant) {
        let mut completed = false;
        for event in events {
            if event.is_completion() {
                completed = true;
                tracing::info!(?event, "completed");
                if self.store.settings().sound_enabled {
                    self.notifier.play_sound();
                }
            }
            if let Some(notice) = event.notice() {
                self.notifier.notify(&notice);
            }
            if event.touches_settings() {
                self.store.save_settings();
            }
        }
        if completed {
            self.save_session(now);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            tracing::info!(visible, "visibility changed");
        }
    }

    fn publish_status(&mut self, now: Instant) {
        let record =
            StatusRecord::compose(&self.engine, self.store.settings(), &self.zone.now(), now);
        match self.status.publish(&record) {
            Ok(_) if self.status_failing => {
                self.status_failing = false;
                tracing::info!("status file writable again");
            }
            Ok(_) => {}
            Err(e) if !self.status_failing => {
                self.status_failing = true;
                tracing::warn!(error = %e, "failed to publish status");
            }
            Err(_) => {}
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("interrupted"),
        _ = terminate => tracing::info!("terminated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notice, SilentNotifier};
    use crate::timer::{CountdownState, PomodoroState, StopwatchState};
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default, Clone)]
    struct Recorder {
        notices: Arc<Mutex<Vec<Notice>>>,
        sounds: Arc<Mutex<u32>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }

        fn play_sound(&self) {
            *self.sounds.lock().unwrap() += 1;
        }
    }

    fn daemon_in(dir: &std::path::Path, notifier: Box<dyn Notifier>, now: Instant) -> Daemon {
        let store = SessionStore::open(dir.join("config"), clock::local_today());
        let paths = DaemonPaths {
            signal: dir.join("clockwork.signal"),
            status: dir.join("status.json"),
        };
        Daemon::new(store, paths, notifier, now)
    }

    #[test]
    fn commands_drive_each_machine() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_in(dir.path(), Box::new(SilentNotifier), now);

        daemon.apply(Command::PomoLong, now).unwrap();
        daemon.apply(Command::PomoToggle, now).unwrap();
        daemon.apply(Command::TimerToggle, now).unwrap();
        daemon.apply(Command::SwToggle, now).unwrap();

        let engine = daemon.engine();
        assert_eq!(engine.pomodoro().mode(), PomodoroMode::LongBreak);
        assert_eq!(engine.pomodoro().state(), PomodoroState::Running);
        assert_eq!(engine.countdown().target_secs(), 600.0);
        assert_eq!(engine.stopwatch().state(), StopwatchState::Running);
        assert!(daemon.store().session_path().exists());
    }

    #[test]
    fn lap_at_zero_elapsed_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_in(dir.path(), Box::new(SilentNotifier), now);
        assert!(daemon.apply(Command::SwLap, now).unwrap().is_empty());
        assert!(daemon.engine().stopwatch().laps().is_empty());
    }

    #[test]
    fn visibility_commands() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_in(dir.path(), Box::new(SilentNotifier), now);
        assert!(daemon.is_visible());
        daemon.apply(Command::ToggleVisibility, now).unwrap();
        assert!(!daemon.is_visible());
        daemon.apply(Command::Show, now).unwrap();
        daemon.apply(Command::Show, now).unwrap();
        assert!(daemon.is_visible());
    }

    #[test]
    fn signal_file_is_consumed_by_poll() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_in(dir.path(), Box::new(SilentNotifier), now);
        std::fs::write(dir.path().join("clockwork.signal"), "sw-toggle\n").unwrap();

        let events = daemon.poll_signal(now);
        assert!(matches!(events[..], [Event::StopwatchStarted { .. }]));
        assert!(!dir.path().join("clockwork.signal").exists());
    }

    #[test]
    fn timer_completion_notifies_with_sound() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let recorder = Recorder::default();
        let mut daemon = daemon_in(dir.path(), Box::new(recorder.clone()), now);

        daemon.apply(Command::TimerToggle, now).unwrap();
        daemon.tick(now + Duration::from_secs(601));

        assert_eq!(daemon.engine().countdown().state(), CountdownState::Stopped);
        assert_eq!(daemon.engine().countdown().progress(), 1.0);
        assert_eq!(*recorder.sounds.lock().unwrap(), 1);
        assert_eq!(recorder.notices.lock().unwrap()[0].title, "Timer Complete!");
    }

    #[test]
    fn focus_completion_persists_counters() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let recorder = Recorder::default();
        let mut daemon = daemon_in(dir.path(), Box::new(recorder.clone()), now);

        daemon.apply(Command::PomoToggle, now).unwrap();
        daemon.tick(now + Duration::from_secs(25 * 60));

        assert_eq!(daemon.store().settings().pomodoro_count, 1);
        let on_disk = std::fs::read_to_string(daemon.store().settings_path()).unwrap();
        assert!(on_disk.contains("pomodoro_count = 1"));
        assert_eq!(recorder.notices.lock().unwrap()[0].title, "Focus Complete!");

        let reopened = SessionStore::open(dir.path().join("config"), clock::local_today());
        let snapshot = reopened.load_session().unwrap();
        assert_eq!(snapshot.pomodoro.unwrap().mode, PomodoroMode::ShortBreak);
    }

    #[test]
    fn muted_sound_still_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let recorder = Recorder::default();
        let mut daemon = daemon_in(dir.path(), Box::new(recorder.clone()), now);
        daemon.store.settings_mut().sound_enabled = false;

        daemon.apply(Command::PomoShort, now).unwrap();
        daemon.apply(Command::PomoToggle, now).unwrap();
        daemon.tick(now + Duration::from_secs(5 * 60));

        assert_eq!(*recorder.sounds.lock().unwrap(), 0);
        assert_eq!(recorder.notices.lock().unwrap()[0].title, "Break Over!");
        assert_eq!(daemon.engine().pomodoro().mode(), PomodoroMode::Work);
    }

    #[test]
    fn shutdown_removes_runtime_files_and_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_in(dir.path(), Box::new(SilentNotifier), now);
        daemon.apply(Command::SwToggle, now).unwrap();
        daemon.tick(now + Duration::from_millis(33));
        assert!(dir.path().join("status.json").exists());

        daemon.shutdown(now + Duration::from_secs(2));
        assert!(!dir.path().join("status.json").exists());

        let store = SessionStore::open(dir.path().join("config"), clock::local_today());
        let restored = Daemon::new(
            store,
            DaemonPaths {
                signal: dir.path().join("clockwork.signal"),
                status: dir.path().join("status.json"),
            },
            Box::new(SilentNotifier),
            Instant::now(),
        );
        assert_eq!(restored.engine().stopwatch().state(), StopwatchState::Running);
        assert!(restored.engine().stopwatch().elapsed(Instant::now()) >= 2.0);
    }

    fn daemon_opened_on(dir: &std::path::Path, day: NaiveDate, now: Instant) -> Daemon {
        let store = SessionStore::open(dir.join("config"), day);
        let paths = DaemonPaths {
            signal: dir.join("clockwork.signal"),
            status: dir.join("status.json"),
        };
        Daemon::new(store, paths, Box::new(SilentNotifier), now)
    }

    #[test]
    fn day_rollover_on_tick_zeroes_counters() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_opened_on(dir.path(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), now);
        daemon.store.settings_mut().pomodoro_count = 7;

        daemon.tick(now);
        assert_eq!(daemon.store().settings().pomodoro_count, 0);
        assert_eq!(
            daemon.store().settings().last_reset_date,
            clock::local_today().format(crate::storage::DATE_FMT).to_string()
        );
    }

    #[test]
    fn completion_after_midnight_counts_toward_the_new_day() {
        let dir = tempfile::tempdir().unwrap();
        let now = Instant::now();
        let mut daemon = daemon_opened_on(dir.path(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), now);
        daemon.store.settings_mut().pomodoro_count = 3;
        daemon.store.settings_mut().daily_focus_minutes = 75;

        daemon.apply(Command::PomoToggle, now).unwrap();
        daemon.tick(now + Duration::from_secs(25 * 60));

        let settings = daemon.store().settings();
        assert_eq!(settings.pomodoro_count, 1);
        assert_eq!(settings.daily_focus_minutes, 25);
    }
}
