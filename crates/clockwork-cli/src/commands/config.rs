use clap::Subcommand;
use clockwork_core::{ConfigError, SessionStore, Settings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "work_duration", "timezone")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset preferences to defaults (today's counters are kept)
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SessionStore::open_default();
    match action {
        ConfigAction::Get { key } => match store.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(ConfigError::UnknownKey(key).into()),
        },
        ConfigAction::Set { key, value } => {
            store.settings_mut().set(&key, &value)?;
            store.try_save_settings()?;
            println!("ok");
        }
        ConfigAction::List => {
            let json = serde_json::to_string_pretty(store.settings())?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let current = store.settings().clone();
            *store.settings_mut() = Settings {
                pomodoro_count: current.pomodoro_count,
                daily_focus_minutes: current.daily_focus_minutes,
                last_reset_date: current.last_reset_date,
                ..Settings::default()
            };
            store.try_save_settings()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
