use chrono::Utc;
use clockwork_core::clock::Zone;
use clockwork_core::{format, SessionStore};

/// Print the configured zone's time, then each extra zone.
pub fn run(extra_zones: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open_default();
    let settings = store.settings();
    let now = Utc::now();

    let ids = std::iter::once(settings.timezone.as_str()).chain(extra_zones.iter().map(String::as_str));
    for id in ids {
        let zone = match id.parse::<Zone>() {
            Ok(zone) => zone,
            Err(e) => {
                eprintln!("{e}, showing local time");
                Zone::Local
            }
        };
        let time = zone.at(now);
        println!(
            "{:<24} {}  {}",
            id,
            format::clock_time(&time, settings.format_24h, settings.show_seconds),
            format::long_date(&time),
        );
    }
    Ok(())
}
