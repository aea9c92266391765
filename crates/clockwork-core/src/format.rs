//! Human-readable time strings shared by the status record and the CLI.

use chrono::{DateTime, FixedOffset};

/// `MM:SS`, or `HH:MM:SS` from one hour up. Fractions are truncated.
pub fn countdown(secs: f64) -> String {
    let total = if secs.is_finite() { secs.max(0.0) as u64 } else { 0 };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// `MM:SS.cc` with minutes growing past 59.
pub fn stopwatch(secs: f64) -> String {
    let centis = if secs.is_finite() {
        (secs.max(0.0) * 100.0).floor() as u64
    } else {
        0
    };
    let (m, s, c) = (centis / 6000, (centis / 100) % 60, centis % 100);
    format!("{m:02}:{s:02}.{c:02}")
}

/// Wall-clock time, e.g. `14:05`, `02:05 PM`, `14:05:09`.
pub fn clock_time(now: &DateTime<FixedOffset>, format_24h: bool, show_seconds: bool) -> String {
    let fmt = match (format_24h, show_seconds) {
        (true, false) => "%H:%M",
        (true, true) => "%H:%M:%S",
        (false, false) => "%I:%M %p",
        (false, true) => "%I:%M:%S %p",
    };
    now.format(fmt).to_string()
}

/// e.g. `Monday, 15 January 2024`.
pub fn long_date(now: &DateTime<FixedOffset>) -> String {
    now.format("%A, %d %B %Y").to_string()
}
