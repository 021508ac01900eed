use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::installer::InstallerActor;
use crate::actor::messages::InstallerMsg;

/// How long installs get to tear down after a shutdown signal.
const SHUTDOWN_GRACE_SECS: u64 = 30;

/// Run all actors concurrently.
pub(super) async fn run_actors(
    fs: FsActor,
    installer: InstallerActor,
    installer_tx: mpsc::Sender<InstallerMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let mut installer_handle = tokio::spawn(async move { installer.run().await });
    let fs_handle = tokio::spawn(async move { fs.run().await });

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if installer_handle.is_finished() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = fs_handle => {}
            _ = &mut installer_handle => return Ok(()),
        }
    }

    crate::debug!("actor"; "sending shutdown to installer");
    let _ = installer_tx.send(InstallerMsg::Shutdown).await;

    let grace = std::time::Duration::from_secs(SHUTDOWN_GRACE_SECS);
    if tokio::time::timeout(grace, installer_handle).await.is_err() {
        crate::log!("actor"; "installer did not stop within {}s", SHUTDOWN_GRACE_SECS);
    }

    Ok(())
}
