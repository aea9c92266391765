mod session;
mod settings;
mod store;

pub use session::{CountdownSnapshot, PomodoroSnapshot, SessionSnapshot, StopwatchSnapshot};
pub use settings::{Settings, DATE_FMT};
pub use store::SessionStore;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;

/// File name of the control signal.
pub const SIGNAL_FILE: &str = "clockwork.signal";
/// File name of the published status record.
pub const STATUS_FILE: &str = "clockwork_status.json";

/// Returns `~/.config/clockwork[-dev]/` based on CLOCKWORK_ENV.
///
/// Set CLOCKWORK_ENV=dev to use a development directory. The directory is
/// created on first write, not here.
pub fn config_dir() -> PathBuf {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CLOCKWORK_ENV").unwrap_or_else(|_| "production".to_string());

    if env == "dev" {
        base_dir.join("clockwork-dev")
    } else {
        base_dir.join("clockwork")
    }
}

/// Per-user runtime directory for the signal and status files:
/// `$XDG_RUNTIME_DIR`, or the system temp dir.
pub fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .unwrap_or_else(std::env::temp_dir)
}

pub fn default_signal_path() -> PathBuf {
    runtime_dir().join(SIGNAL_FILE)
}

pub fn default_status_path() -> PathBuf {
    runtime_dir().join(STATUS_FILE)
}

/// Replace `path` with `contents` so readers never see a partial file:
/// write a sibling temp file, sync it, then rename over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let failed = |source| PersistenceError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(failed)?;
    }
    write_via_temp(path, contents, true).map_err(failed)
}

/// Like [`write_atomic`] but without the fsync or parent creation. For
/// high-frequency files that are rewritten long before durability matters.
pub(crate) fn replace_file(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    write_via_temp(path, contents, false).map_err(|source| PersistenceError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn write_via_temp(path: &Path, contents: &[u8], sync: bool) -> std::io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        if sync {
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Remove `path`, treating a missing file as success.
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
