//! Actor Coordinator - Wires up the Auto-Install Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Wires up actors
//! - Runs them concurrently

mod runtime;
pub(super) mod watch_paths;

use std::path::PathBuf;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::installer::InstallerActor;
use super::messages::{FsCmd, InstallerMsg};
use crate::engine::AutoInstaller;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    engine: AutoInstaller,
    sources: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    installer_tx: mpsc::Sender<InstallerMsg>,
    installer_rx: mpsc::Receiver<InstallerMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create for an engine and the sources to enable at startup.
    pub fn new(engine: AutoInstaller, sources: Vec<PathBuf>) -> Self {
        let (installer_tx, installer_rx) = mpsc::channel(CHANNEL_BUFFER);
        Self {
            engine,
            sources,
            config_path: None,
            installer_tx,
            installer_rx,
            shutdown_rx: None,
        }
    }

    /// Watch the config file and reload settings when it changes.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Sender for host signals and commands (the control endpoint).
    pub fn sender(&self) -> mpsc::Sender<InstallerMsg> {
        self.installer_tx.clone()
    }

    /// Run the actor system until shutdown.
    pub async fn run(self) -> Result<()> {
        let (fs_tx, fs_rx) = mpsc::channel::<FsCmd>(CHANNEL_BUFFER);

        // Watcher first: edits made while the startup batch runs are kept.
        let watch_paths = watch_paths::collect_watch_paths(&self.sources, self.config_path.as_deref());
        let fs_actor = FsActor::new(watch_paths, self.config_path, self.installer_tx.clone(), fs_rx)
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;

        let installer_actor =
            InstallerActor::new(self.installer_rx, fs_tx, self.engine, self.sources);

        crate::debug!("actor"; "start");
        runtime::run_actors(fs_actor, installer_actor, self.installer_tx, self.shutdown_rx).await?;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
