//! TOML-based user settings.
//!
//! Stores user preferences and the daily counters:
//! - Pomodoro durations and long-break interval
//! - Default countdown length
//! - Clock zone and display format
//! - Sound and auto-start behavior
//! - Today's session count and focus minutes
//!
//! Settings are stored at `~/.config/clockwork/settings.toml`. Every field
//! falls back to its default when missing, so files written by older
//! versions keep loading.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::Zone;
use crate::error::ConfigError;
use crate::timer::{validate_minutes, MAX_MINUTES, MIN_MINUTES};

/// Date format of `last_reset_date`.
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Work session length in minutes.
    pub work_duration: u32,
    pub short_break: u32,
    pub long_break: u32,
    /// Every n-th completed work session is followed by a long break.
    pub long_break_interval: u32,
    /// Countdown length started by `timer-toggle`.
    pub timer_minutes: u32,
    /// IANA zone name, or `local`.
    #[serde(alias = "timezone_str")]
    pub timezone: String,
    pub format_24h: bool,
    pub show_seconds: bool,
    pub sound_enabled: bool,
    pub auto_start_breaks: bool,
    pub pomodoro_count: u32,
    pub daily_focus_minutes: u32,
    pub last_reset_date: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break: 5,
            long_break: 15,
            long_break_interval: 4,
            timer_minutes: 10,
            timezone: crate::clock::LOCAL_ZONE.into(),
            format_24h: false,
            show_seconds: true,
            sound_enabled: true,
            auto_start_breaks: false,
            pomodoro_count: 0,
            daily_focus_minutes: 0,
            last_reset_date: String::new(),
        }
    }
}

impl Settings {
    /// Parse persisted settings over the defaults and repair out-of-range
    /// values.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let parsed: Settings = toml::from_str(content)?;
        Ok(parsed.sanitized())
    }

    /// Replace values a user could have hand-edited out of range with their
    /// defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for (key, value, fallback) in [
            ("work_duration", &mut self.work_duration, defaults.work_duration),
            ("short_break", &mut self.short_break, defaults.short_break),
            ("long_break", &mut self.long_break, defaults.long_break),
        ] {
            if validate_minutes(*value as i64).is_err() {
                tracing::warn!(key, value = *value, "setting out of range, using default");
                *value = fallback;
            }
        }
        if self.long_break_interval == 0 {
            self.long_break_interval = defaults.long_break_interval;
        }
        if self.timer_minutes == 0 {
            self.timer_minutes = defaults.timer_minutes;
        }
        self
    }

    /// Zero the daily counters if `today` differs from the last reset date.
    /// Returns true when a reset happened.
    pub fn roll_over_day(&mut self, today: NaiveDate) -> bool {
        let today = today.format(DATE_FMT).to_string();
        if self.last_reset_date == today {
            return false;
        }
        self.pomodoro_count = 0;
        self.daily_focus_minutes = 0;
        self.last_reset_date = today;
        true
    }

    /// Get a setting value as string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a setting by key, validating the result. Leaves `self` untouched
    /// on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(key, e))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => {
                serde_json::Value::Bool(value.trim().parse::<bool>().map_err(|e| invalid(key, e))?)
            }
            serde_json::Value::Number(_) => {
                let n = value.trim().parse::<u32>().map_err(|e| invalid(key, e))?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.trim().into()),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Settings = serde_json::from_value(json).map_err(|e| invalid(key, e))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("work_duration", self.work_duration),
            ("short_break", self.short_break),
            ("long_break", self.long_break),
        ] {
            if validate_minutes(value as i64).is_err() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: format!("must be between {MIN_MINUTES} and {MAX_MINUTES} minutes"),
                });
            }
        }
        if self.long_break_interval == 0 {
            return Err(invalid("long_break_interval", "must be at least 1"));
        }
        if self.timer_minutes == 0 {
            return Err(invalid("timer_minutes", "must be greater than zero"));
        }
        if let Err(e) = self.timezone.parse::<Zone>() {
            return Err(invalid("timezone", e));
        }
        if !self.last_reset_date.is_empty()
            && NaiveDate::parse_from_str(&self.last_reset_date, DATE_FMT).is_err()
        {
            return Err(invalid("last_reset_date", "expected YYYY-MM-DD"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed = Settings::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_merge_over_defaults() {
        let parsed = Settings::from_toml("work_duration = 50\nformat_24h = true\n").unwrap();
        assert_eq!(parsed.work_duration, 50);
        assert!(parsed.format_24h);
        assert_eq!(parsed.short_break, 5);
        assert_eq!(parsed.timezone, "local");
    }

    #[test]
    fn legacy_timezone_key_is_accepted() {
        let parsed = Settings::from_toml("timezone_str = \"Asia/Tokyo\"\n").unwrap();
        assert_eq!(parsed.timezone, "Asia/Tokyo");
    }

    #[test]
    fn out_of_range_durations_are_repaired() {
        let parsed = Settings::from_toml("work_duration = 0\nlong_break = 999\n").unwrap();
        assert_eq!(parsed.work_duration, 25);
        assert_eq!(parsed.long_break, 15);
    }

    #[test]
    fn roll_over_day_resets_once() {
        let mut settings = Settings {
            pomodoro_count: 6,
            daily_focus_minutes: 150,
            last_reset_date: "2024-03-09".into(),
            ..Settings::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(settings.roll_over_day(today));
        assert_eq!(settings.pomodoro_count, 0);
        assert_eq!(settings.daily_focus_minutes, 0);
        assert_eq!(settings.last_reset_date, "2024-03-10");

        settings.pomodoro_count = 2;
        assert!(!settings.roll_over_day(today));
        assert_eq!(settings.pomodoro_count, 2);
    }

    #[test]
    fn get_returns_string_for_all_types() {
        let settings = Settings::default();
        assert_eq!(settings.get("work_duration").as_deref(), Some("25"));
        assert_eq!(settings.get("format_24h").as_deref(), Some("false"));
        assert_eq!(settings.get("timezone").as_deref(), Some("local"));
        assert!(settings.get("missing_key").is_none());
    }

    #[test]
    fn set_updates_and_validates() {
        let mut settings = Settings::default();
        settings.set("short_break", "7").unwrap();
        settings.set("auto_start_breaks", "true").unwrap();
        settings.set("timezone", "Europe/Paris").unwrap();
        assert_eq!(settings.short_break, 7);
        assert!(settings.auto_start_breaks);
        assert_eq!(settings.timezone, "Europe/Paris");
    }

    #[test]
    fn set_rejects_bad_values_without_mutation() {
        let mut settings = Settings::default();
        let before = settings.clone();
        assert!(matches!(
            settings.set("nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(settings.set("work_duration", "181").is_err());
        assert!(settings.set("work_duration", "abc").is_err());
        assert!(settings.set("format_24h", "not_a_bool").is_err());
        assert!(settings.set("timezone", "Mars/Olympus_Mons").is_err());
        assert!(settings.set("timer_minutes", "0").is_err());
        assert_eq!(settings, before);
    }
}
