use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

use super::InstallerActor;
use crate::actor::messages::{FsCmd, InstallerMsg};
use crate::build::testing::{SharedLog, fakes, make_ufo, set_glyph};
use crate::build::{ArtifactStore, Orchestrator};
use crate::compat::CompatResolver;
use crate::engine::{AutoInstaller, Settings, Status};
use crate::registry::Registry;
use crate::schedule::Activity;

struct Harness {
    _dir: TempDir,
    ufo: PathBuf,
    log: SharedLog,
    tx: mpsc::Sender<InstallerMsg>,
    fs_rx: mpsc::Receiver<FsCmd>,
    handle: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let ufo = crate::utils::path::normalize_path(dir.path()).join("Test-Regular.ufo");
        make_ufo(&ufo, "Test", "Regular");

        let (log, generator, installer) = fakes();
        let orchestrator = Orchestrator::new(
            generator,
            installer,
            Registry::new(),
            CompatResolver::default(),
            ArtifactStore::new(dir.path().join("artifacts")),
        );
        let engine = AutoInstaller::new(orchestrator, Settings::default());

        let (tx, rx) = mpsc::channel(32);
        let (fs_tx, fs_rx) = mpsc::channel(8);
        let actor = InstallerActor::new(rx, fs_tx, engine, vec![ufo.clone()]);
        let handle = tokio::spawn(actor.run());

        Self {
            _dir: dir,
            ufo,
            log,
            tx,
            fs_rx,
            handle,
        }
    }

    async fn status(&self) -> Status {
        let (reply, rx) = oneshot::channel();
        self.tx.send(InstallerMsg::Status(reply)).await.unwrap();
        rx.await.unwrap()
    }

    async fn edit(&self, size: i32) {
        set_glyph(&self.ufo, size);
        let glif = self.ufo.join("glyphs/a.glif");
        self.tx.send(InstallerMsg::Changed(vec![glif])).await.unwrap();
    }

    fn generated(&self) -> usize {
        self.log.lock().generated.len()
    }
}

#[tokio::test(start_paused = true)]
async fn test_startup_installs_and_publishes_roots() {
    let mut h = Harness::start();

    let status = h.status().await;
    assert_eq!(status.cycles, 1);
    assert_eq!(status.installed.len(), 1);

    match h.fs_rx.recv().await {
        Some(FsCmd::SetRoots(roots)) => assert_eq!(roots, vec![h.ufo.clone()]),
        None => panic!("roots never published"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_edit_burst_installs_once_after_quiet_period() {
    let h = Harness::start();
    assert_eq!(h.status().await.cycles, 1);

    h.edit(120).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.edit(140).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    h.edit(160).await;

    let pending = h.status().await;
    assert!(pending.timer.armed);
    assert_eq!(pending.cycles, 1);
    assert_eq!(h.generated(), 1);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let done = h.status().await;
    assert!(!done.timer.armed);
    assert_eq!(done.cycles, 2);
    assert_eq!(h.generated(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_activity_extends_pending_cycle() {
    let h = Harness::start();
    h.edit(120).await;

    tokio::time::sleep(Duration::from_secs(4)).await;
    h.tx.send(InstallerMsg::Activity(Activity::KeyDown)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(h.status().await.cycles, 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.status().await.cycles, 2);
}

#[tokio::test(start_paused = true)]
async fn test_reinstall_replies_with_report() {
    let h = Harness::start();
    let (reply, rx) = oneshot::channel();
    h.tx
        .send(InstallerMsg::Reinstall {
            paths: vec![],
            reply: Some(reply),
        })
        .await
        .unwrap();

    let report = rx.await.unwrap();
    assert!(!report.is_empty());
    assert_eq!(h.generated(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_uninstalls() {
    let h = Harness::start();
    assert_eq!(h.status().await.installed.len(), 1);

    h.tx.send(InstallerMsg::Shutdown).await.unwrap();
    h.handle.await.unwrap();
    assert_eq!(h.log.lock().uninstalled.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disable_drops_roots() {
    let mut h = Harness::start();
    assert!(matches!(h.fs_rx.recv().await, Some(FsCmd::SetRoots(_))));

    h.tx.send(InstallerMsg::Disable(h.ufo.clone())).await.unwrap();
    let status = h.status().await;
    assert!(status.installed.is_empty());

    match h.fs_rx.recv().await {
        Some(FsCmd::SetRoots(roots)) => assert!(roots.is_empty()),
        None => panic!("roots never updated"),
    }
}
