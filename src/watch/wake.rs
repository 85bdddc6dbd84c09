// src/watch/wake.rs

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::info;

/// Early wake-up for the scan loop, driven by OS filesystem events.
///
/// Events never trigger a rebuild on their own: they only cut the sleep
/// between two scans short, and the scanner still decides whether anything
/// changed. Dropping this handle stops the underlying watcher.
pub struct WakeSignal {
    _inner: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl std::fmt::Debug for WakeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeSignal").finish_non_exhaustive()
    }
}

impl WakeSignal {
    /// Sleep for `interval` or until a filesystem event arrives, whichever
    /// comes first. Returns `true` when woken by an event.
    ///
    /// At most one wake-up is pending at a time, so a burst of events during
    /// a long build causes one early wake-up.
    pub async fn wait(&mut self, interval: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(interval) => false,
            Some(()) = self.rx.recv() => true,
        }
    }
}

/// Start a recursive watcher on `root`.
pub fn spawn_wake_watcher(root: &Path) -> Result<WakeSignal> {
    let (tx, rx) = mpsc::channel::<()>(1);

    // Called synchronously by notify on its own thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_access() {
                    return;
                }
                // Full means a wake-up is already pending; closed means the
                // loop has stopped. Nothing to do either way.
                let _ = tx.try_send(());
            }
            Err(err) => {
                eprintln!("devloop: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(root, RecursiveMode::Recursive)?;

    info!("filesystem events enabled on {:?}", root);

    Ok(WakeSignal {
        _inner: watcher,
        rx,
    })
}
