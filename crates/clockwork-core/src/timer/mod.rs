mod countdown;
mod engine;
mod pomodoro;
mod stopwatch;

pub use countdown::{Countdown, CountdownState};
pub use engine::TimerEngine;
pub use pomodoro::{validate_minutes, Pomodoro, PomodoroMode, PomodoroState, MAX_MINUTES, MIN_MINUTES};
pub use stopwatch::{classify_laps, Lap, LapClass, Stopwatch, StopwatchState};
