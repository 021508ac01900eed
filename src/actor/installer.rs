//! Installer Actor - drives the auto-install engine
//!
//! Owns the `AutoInstaller` and serializes every signal into it: debounced
//! file changes from the FsActor, host signals and user commands from the
//! control endpoint, and the quiet-period timer itself. Watch roots are
//! pushed back to the FsActor whenever the watch set changes them.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::messages::{FsCmd, InstallerMsg};
use crate::engine::AutoInstaller;

pub struct InstallerActor {
    rx: mpsc::Receiver<InstallerMsg>,
    fs_tx: mpsc::Sender<FsCmd>,
    engine: AutoInstaller,
    /// Sources enabled from configuration, diffed on reload.
    sources: Vec<PathBuf>,
    /// Roots last sent to the FsActor.
    roots: Vec<PathBuf>,
}

impl InstallerActor {
    pub fn new(
        rx: mpsc::Receiver<InstallerMsg>,
        fs_tx: mpsc::Sender<FsCmd>,
        engine: AutoInstaller,
        sources: Vec<PathBuf>,
    ) -> Self {
        Self {
            rx,
            fs_tx,
            engine,
            sources,
            roots: Vec::new(),
        }
    }

    /// Run the startup batch, then serve messages until shutdown.
    pub async fn run(mut self) {
        let sources = self.sources.clone();
        self.engine.startup(&sources);
        self.sync_roots().await;

        loop {
            let sleep = self.engine.sleep_duration(now());
            tokio::select! {
                biased;
                msg = self.rx.recv() => {
                    let Some(msg) = msg else { break };
                    if !self.handle(msg) {
                        break;
                    }
                }
                _ = tokio::time::sleep(sleep) => {
                    self.engine.poll(now());
                }
            }
            self.sync_roots().await;
        }

        self.engine.shutdown();
        crate::debug!("actor"; "installer stopped");
    }

    /// Returns `false` on shutdown.
    fn handle(&mut self, msg: InstallerMsg) -> bool {
        match msg {
            InstallerMsg::Changed(paths) => {
                self.engine.on_paths_changed(&paths, now());
            }
            InstallerMsg::ConfigChanged => self.on_config_changed(),
            InstallerMsg::Activity(activity) => {
                self.engine.on_activity(activity, now());
            }
            InstallerMsg::Opened(path) => {
                self.engine.on_opened(&path);
            }
            InstallerMsg::Closed(path) => {
                self.engine.on_closed(&path);
            }
            InstallerMsg::Saved(path) => {
                self.engine.on_saved(&path);
            }
            InstallerMsg::ResignActive => {
                self.engine.on_resign_active();
            }
            InstallerMsg::Enable(path) => {
                self.engine.enable(&path);
            }
            InstallerMsg::Disable(path) => {
                self.engine.disable(&path);
            }
            InstallerMsg::Queue(path) => {
                if !self.engine.queue(&path, now()) {
                    crate::log!("install"; "only design spaces can be queued: {}", path.display());
                }
            }
            InstallerMsg::Reinstall { paths, reply } => {
                let report = self.engine.reinstall(&paths, now());
                if let Some(reply) = reply {
                    let _ = reply.send(report);
                }
            }
            InstallerMsg::Status(reply) => {
                let _ = reply.send(self.engine.status(now()));
            }
            InstallerMsg::Shutdown => return false,
        }
        true
    }

    /// Reload settings and follow `[sources]` edits.
    fn on_config_changed(&mut self) {
        match crate::config::reload_config() {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                crate::logger::status_error("config reload failed", &e.to_string());
                return;
            }
        }

        let config = crate::config::cfg();
        self.engine.apply_settings(config.to_settings(), now());

        let sources = config.source_paths();
        for path in self.sources.iter().filter(|p| !sources.contains(p)) {
            self.engine.disable(path);
        }
        for path in sources.iter().filter(|p| !self.sources.contains(p)) {
            self.engine.enable(path);
        }
        self.sources = sources;
        crate::log!("config"; "reloaded");
    }

    async fn sync_roots(&mut self) {
        let roots = self.engine.watch_roots();
        if roots == self.roots {
            return;
        }
        self.roots = roots.clone();
        // The FsActor outlives us except during shutdown.
        let _ = self.fs_tx.send(FsCmd::SetRoots(roots)).await;
    }
}

/// Wall clock as seen by the tokio runtime, so paused test time applies.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}
