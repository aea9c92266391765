//! # Clockwork Core Library
//!
//! This library provides the time-tracking engine behind the `clockwork-cli`
//! binary: a Pomodoro session timer, a countdown timer and a stopwatch with
//! laps, all driven from a single cooperative tick loop.
//!
//! ## Architecture
//!
//! - **Timer Engine**: closed state machines that require the caller to
//!   invoke `tick()` with the elapsed time; they never read the clock
//! - **Storage**: TOML settings with daily counters and a JSON session
//!   snapshot reconciled against wall-clock time on restart
//! - **Gateway**: a signal file for one-word control commands and a status
//!   file for status bars
//! - **Daemon**: tokio loop tying the tick scheduler, gateway and storage
//!   together
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Owns the three sub-machines
//! - [`SessionStore`]: Settings and session persistence
//! - [`Daemon`]: Long-running host with Ctrl-C / SIGTERM shutdown
//! - [`StatusRecord`]: What status bars read

pub mod clock;
pub mod daemon;
pub mod error;
pub mod events;
pub mod format;
pub mod gateway;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod timer;

pub use daemon::{Daemon, DaemonPaths};
pub use error::{ConfigError, CoreError, DurationError, PersistenceError};
pub use events::Event;
pub use gateway::{Command, SignalChannel, StatusClass, StatusPublisher, StatusRecord};
pub use notify::{DesktopNotifier, Notice, Notifier, SilentNotifier};
pub use storage::{SessionSnapshot, SessionStore, Settings};
pub use timer::{
    Countdown, CountdownState, Lap, LapClass, Pomodoro, PomodoroMode, PomodoroState, Stopwatch,
    StopwatchState, TimerEngine,
};
