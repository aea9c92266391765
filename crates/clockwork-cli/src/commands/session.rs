use std::time::Instant;

use chrono::Utc;
use clockwork_core::format;
use clockwork_core::{LapClass, SessionStore};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open_default();
    let Some(snapshot) = store.load_session() else {
        println!("no saved session");
        return Ok(());
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let now = Instant::now();
    let settings = store.settings();
    let engine = snapshot.restore(settings, now, Utc::now());

    let pomodoro = engine.pomodoro();
    println!(
        "Pomodoro   {:<16} {:<8} {} / {}",
        pomodoro.mode().label(),
        pomodoro.state().as_str(),
        format::countdown(pomodoro.remaining_secs()),
        format::countdown(pomodoro.total_secs()),
    );

    let countdown = engine.countdown();
    println!(
        "Timer      {:<16} {:<8} {}",
        "",
        countdown.state().as_str(),
        format::countdown(countdown.remaining_secs()),
    );

    let stopwatch = engine.stopwatch();
    println!(
        "Stopwatch  {:<16} {:<8} {}",
        "",
        stopwatch.state().as_str(),
        format::stopwatch(stopwatch.elapsed(now)),
    );
    for (lap, class) in stopwatch.classified_laps() {
        let tag = match class {
            LapClass::Best => "best",
            LapClass::Worst => "worst",
            LapClass::Normal => "",
        };
        println!(
            "  Lap {:>3}  {}  {}  {tag}",
            lap.number,
            format::stopwatch(lap.split_secs),
            format::stopwatch(lap.cumulative_secs),
        );
    }

    println!(
        "Today: {} sessions, {} focus minutes",
        settings.pomodoro_count, settings.daily_focus_minutes
    );
    Ok(())
}
