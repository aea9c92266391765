//! Desktop notification and completion sound collaborators.
//!
//! Both are fire-and-forget: they run on detached threads the daemon never
//! waits on or retries, and a failure is at most a debug log line.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Sound files tried in order; the first one present is played.
const SOUND_FILES: [&str; 2] = [
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/freedesktop/stereo/bell.oga",
];

const SOUND_PLAYER: &str = "paplay";

const APP_NAME: &str = "Clockwork";

/// A notification request: title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Side-effect sink for completions.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
    fn play_sound(&self);
}

/// Notifications over the desktop bus, sound through `paplay`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notice: &Notice) {
        let notice = notice.clone();
        std::thread::spawn(move || {
            let shown = notify_rust::Notification::new()
                .summary(&notice.title)
                .body(&notice.body)
                .appname(APP_NAME)
                .icon("alarm-clock")
                .show();
            if let Err(e) = shown {
                tracing::debug!(error = %e, title = %notice.title, "notification not shown");
            }
        });
    }

    fn play_sound(&self) {
        std::thread::spawn(|| {
            let Some(file) = SOUND_FILES.iter().find(|f| Path::new(f).exists()) else {
                tracing::debug!("no completion sound installed");
                return;
            };
            match play_file(SOUND_PLAYER, Path::new(file)) {
                Ok(status) if !status.success() => {
                    tracing::debug!(%status, file = %file, "sound player failed");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "could not play completion sound"),
            }
        });
    }
}

/// Run `player` on `file` and wait for it, so no child is left unreaped.
fn play_file(player: &str, file: &Path) -> std::io::Result<ExitStatus> {
    Command::new(player)
        .arg(file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}

/// Drops everything. Used with `run --quiet` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::debug!(title = %notice.title, body = %notice.body, "notification suppressed");
    }

    fn play_sound(&self) {}
}
