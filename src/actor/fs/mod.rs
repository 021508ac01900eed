//! FileSystem Actor
//!
//! Watches the roots of every watched source and sends debounced path
//! changes to the InstallerActor. Implements the "Watcher-First" pattern:
//! the watcher is live before the startup batch runs, so edits made during
//! that batch are still seen.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → Router → InstallerMsg
//!    ▲
//!    └── FsCmd::SetRoots (roots follow the watch set)
//! ```

use std::path::PathBuf;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::coordinator::watch_paths::collect_watch_paths;
use super::messages::{FsCmd, InstallerMsg};

// Pure timing and deduplication.
mod debouncer;
// Event routing (debounced events -> InstallerMsg).
mod router;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use router::{events_to_messages, log_events};
use types::DebouncedEvents;
use watch_roots::WatchRoots;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer
    watch_roots: WatchRoots,
    /// Channel to send messages to InstallerActor
    installer_tx: mpsc::Sender<InstallerMsg>,
    /// Root updates from the InstallerActor
    cmd_rx: mpsc::Receiver<FsCmd>,
    /// Debouncer state
    debouncer: Debouncer,
    /// Config file, reported separately so settings can be reloaded
    config_path: Option<PathBuf>,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    pub fn new(
        paths: Vec<PathBuf>,
        config_path: Option<PathBuf>,
        installer_tx: mpsc::Sender<InstallerMsg>,
        cmd_rx: mpsc::Receiver<FsCmd>,
    ) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Missing roots are attached later by `maintain`.
        let mut watch_roots = WatchRoots::new(paths);
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            installer_tx,
            cmd_rx,
            debouncer: Debouncer::new(),
            config_path,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            installer_tx,
            mut cmd_rx,
            mut debouncer,
            config_path,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Bridge the blocking notify channel into the async loop.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                cmd = cmd_rx.recv() => match cmd {
                    Some(FsCmd::SetRoots(roots)) => {
                        let paths = collect_watch_paths(&roots, config_path.as_deref());
                        watch_roots.set_desired(paths, &mut watcher);
                    }
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    if process_changes(&mut debouncer, &installer_tx, config_path.as_deref())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }
    }
}

/// Forward debounced file changes
///
/// Returns `Err(())` if InstallerActor shut down
async fn process_changes(
    debouncer: &mut Debouncer,
    installer_tx: &mpsc::Sender<InstallerMsg>,
    config_path: Option<&std::path::Path>,
) -> Result<(), ()> {
    let Some(raw_events) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let events = DebouncedEvents::from_changes(raw_events);
    log_events(&events);

    for msg in events_to_messages(&events, config_path) {
        installer_tx.send(msg).await.map_err(|_| ())?;
    }
    Ok(())
}
