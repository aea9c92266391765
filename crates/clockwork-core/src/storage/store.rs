//! On-disk home of the settings and the session snapshot.
//!
//! ```text
//! ~/.config/clockwork/
//!   settings.toml   user preferences + daily counters
//!   session.json    last captured timer state
//! ```
//!
//! Save failures are logged and never interrupt timing; `try_*` variants
//! surface them for callers that want to report.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;

use super::{config_dir, write_atomic, SessionSnapshot, Settings};
use crate::error::{PersistenceError, Result};

const SETTINGS_FILE: &str = "settings.toml";
const SESSION_FILE: &str = "session.json";

#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    settings: Settings,
    /// Modification time of the settings file as last read or written.
    settings_mtime: Option<SystemTime>,
}

impl SessionStore {
    /// Open the store in `dir`, merging the settings file over defaults.
    ///
    /// A missing or corrupt settings file yields defaults. The daily reset
    /// runs against `today`. The file is written back only when the merged
    /// result differs from what was read, so opening never clobbers counters
    /// another process saved in the meantime.
    pub fn open(dir: impl Into<PathBuf>, today: NaiveDate) -> Self {
        let dir = dir.into();
        let path = dir.join(SETTINGS_FILE);
        let (settings, on_disk) = match load_settings(&path) {
            Ok(Some((settings, content))) => (settings, Some(content)),
            Ok(None) => {
                tracing::info!(path = %path.display(), "no settings file, using defaults");
                (Settings::default(), None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable settings, using defaults");
                (Settings::default(), None)
            }
        };

        let mut store = Self {
            dir,
            settings,
            settings_mtime: modified(&path),
        };
        let rolled = store.settings.roll_over_day(today);
        if rolled {
            tracing::info!(date = %store.settings.last_reset_date, "daily counters reset");
        }
        let current = toml::to_string_pretty(&store.settings).ok();
        if rolled || on_disk.is_none() || current != on_disk {
            store.save_settings();
        }
        store
    }

    /// Open the store in [`config_dir`] for the local calendar day.
    pub fn open_default() -> Self {
        Self::open(config_dir(), crate::clock::local_today())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable settings; call [`SessionStore::save_settings`] afterwards.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Persist settings, logging instead of failing.
    pub fn save_settings(&mut self) {
        if let Err(e) = self.try_save_settings() {
            tracing::warn!(error = %e, "failed to save settings");
        }
    }

    pub fn try_save_settings(&mut self) -> Result<()> {
        let content =
            toml::to_string_pretty(&self.settings).map_err(|e| PersistenceError::SerializeFailed {
                what: "settings",
                message: e.to_string(),
            })?;
        let path = self.settings_path();
        write_atomic(&path, content.as_bytes())?;
        self.settings_mtime = modified(&path);
        Ok(())
    }

    /// Zero the daily counters when `today` is a new day, persisting the
    /// change. Returns true when a reset happened.
    pub fn roll_over_day(&mut self, today: NaiveDate) -> bool {
        if !self.settings.roll_over_day(today) {
            return false;
        }
        tracing::info!(date = %self.settings.last_reset_date, "daily counters reset");
        self.save_settings();
        true
    }

    /// Re-read the settings file if something else modified it since our
    /// last read or write. Returns true when new settings were loaded.
    pub fn reload_if_changed(&mut self) -> bool {
        let path = self.settings_path();
        let mtime = modified(&path);
        if mtime.is_none() || mtime == self.settings_mtime {
            return false;
        }
        self.settings_mtime = mtime;
        match load_settings(&path) {
            Ok(Some((settings, _))) if settings != self.settings => {
                tracing::info!("settings file changed, reloaded");
                self.settings = settings;
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::warn!(error = %e, "keeping current settings");
                false
            }
        }
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Last saved snapshot, or `None` when absent or unreadable.
    pub fn load_session(&self) -> Option<SessionSnapshot> {
        let path = self.session_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read session");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt session");
                None
            }
        }
    }

    pub fn save_session(&self, snapshot: &SessionSnapshot) {
        if let Err(e) = self.try_save_session(snapshot) {
            tracing::warn!(error = %e, "failed to save session");
        }
    }

    pub fn try_save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.session_path(), content.as_bytes())?;
        Ok(())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Parsed settings with the raw file content; `Ok(None)` when the file does
/// not exist.
fn load_settings(path: &Path) -> Result<Option<(Settings, String)>, PersistenceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Settings::from_toml(&content)
        .map(|settings| Some((settings, content)))
        .map_err(|e| PersistenceError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
