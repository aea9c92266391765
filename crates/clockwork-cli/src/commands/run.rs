use std::time::Instant;

use clockwork_core::{Daemon, DaemonPaths, DesktopNotifier, Notifier, SessionStore, SilentNotifier};

pub fn run(paths: DaemonPaths, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::open_default();
    tracing::info!(config = %store.dir().display(), "settings loaded");

    let notifier: Box<dyn Notifier> = if quiet {
        Box::new(SilentNotifier)
    } else {
        Box::new(DesktopNotifier)
    };
    let daemon = Daemon::new(store, paths, notifier, Instant::now());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(daemon.run());
    Ok(())
}
