//! `watch`: the long-running auto-install mode.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::actor::Coordinator;
use crate::config::AutoInstallConfig;
use crate::control;
use crate::core::{register_server, register_shutdown, stop_server};
use crate::log;
use crate::schedule::StatusCountdown;

/// How long to wait for the control endpoint thread after the actors stop.
const CONTROL_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub fn watch(config: &AutoInstallConfig) -> Result<()> {
    let sources = config.source_paths();
    if sources.is_empty() {
        log!("watch"; "no sources configured; add them under [sources] or enable one via the control endpoint");
    }

    let engine = super::common::build_engine(config)?.with_observer(Box::new(StatusCountdown));

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    register_shutdown(shutdown_tx);

    let mut coordinator = Coordinator::new(engine, sources).with_shutdown_signal(shutdown_rx);
    if config.config_path.exists() {
        coordinator = coordinator.with_config_path(config.config_path.clone());
    }

    let control = if config.control.enable {
        let server = control::bind_with_retry(config.control.interface, config.control.port)?;
        register_server(server.handle());
        log!("control"; "listening on http://{}", server.addr());
        Some(server.spawn(coordinator.sender())?)
    } else {
        None
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let result = rt.block_on(coordinator.run());

    stop_server();
    wait_for_control(control);
    result
}

/// Wait for the control thread to drain (bounded).
fn wait_for_control(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    let step = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while waited < CONTROL_JOIN_TIMEOUT {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(step);
        waited += step;
    }
}
