//! Signal-file control channel.
//!
//! A client writes a single command word into the signal file; the daemon
//! polls for it, consumes (deletes) it, and applies it. Any unrecognized
//! word toggles window visibility.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{CoreError, Result};
use crate::storage::{remove_if_exists, write_atomic};

/// A control command read from the signal file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    PomoToggle,
    PomoWork,
    PomoShort,
    PomoLong,
    PomoReset,
    TimerToggle,
    TimerReset,
    SwToggle,
    SwLap,
    SwReset,
    Show,
    ToggleVisibility,
}

impl Command {
    /// Every command with a dedicated word, in documentation order.
    pub const ALL: [Command; 11] = [
        Command::PomoToggle,
        Command::PomoWork,
        Command::PomoShort,
        Command::PomoLong,
        Command::PomoReset,
        Command::TimerToggle,
        Command::TimerReset,
        Command::SwToggle,
        Command::SwLap,
        Command::SwReset,
        Command::Show,
    ];

    /// Map signal content to a command. Surrounding whitespace is ignored;
    /// anything unknown is a visibility toggle.
    pub fn parse(content: &str) -> Command {
        let word = content.trim();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == word)
            .unwrap_or(Command::ToggleVisibility)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::PomoToggle => "pomo-toggle",
            Command::PomoWork => "pomo-work",
            Command::PomoShort => "pomo-short",
            Command::PomoLong => "pomo-long",
            Command::PomoReset => "pomo-reset",
            Command::TimerToggle => "timer-toggle",
            Command::TimerReset => "timer-reset",
            Command::SwToggle => "sw-toggle",
            Command::SwLap => "sw-lap",
            Command::SwReset => "sw-reset",
            Command::Show => "show",
            Command::ToggleVisibility => "toggle",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signal file, seen from either side.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    path: PathBuf,
    /// A signal we applied but could not delete, by mtime and content.
    stuck: Option<(Option<SystemTime>, Vec<u8>)>,
}

impl SignalChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stuck: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume a pending command, if any.
    ///
    /// The file is deleted whether or not its content decodes; content that
    /// is not UTF-8 yields [`CoreError::MalformedSignal`]. A file that cannot
    /// be deleted is still applied, once, until it is replaced.
    pub fn poll(&mut self) -> Result<Option<Command>> {
        let stamp = std::fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.stuck = None;
                return Ok(None);
            }
            Err(e) => {
                let _ = remove_if_exists(&self.path);
                return Err(e.into());
            }
        };

        if let Some((stuck_stamp, stuck_bytes)) = &self.stuck {
            if *stuck_stamp == stamp && *stuck_bytes == bytes {
                return Ok(None);
            }
        }
        match remove_if_exists(&self.path) {
            Ok(()) => self.stuck = None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cannot remove signal file, applying it once"
                );
                self.stuck = Some((stamp, bytes.clone()));
            }
        }

        let content = String::from_utf8(bytes)
            .map_err(|e| CoreError::MalformedSignal(format!("not UTF-8: {e}")))?;
        Ok(Some(Command::parse(&content)))
    }

    /// Leave `word` for the daemon to pick up.
    pub fn send(&self, word: &str) -> Result<()> {
        write_atomic(&self.path, word.trim().as_bytes())?;
        Ok(())
    }

    /// Drop a stale signal.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)?;
        Ok(())
    }
}
