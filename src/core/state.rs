//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SHUTDOWN_TX`: Signal to the actor system, which tears down installs
//! - `SERVER`: Control endpoint to unblock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Control endpoint reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Nothing registered: exit immediately
/// - Actors registered: graceful shutdown (notify actors, unblock server)
/// - Second Ctrl+C while shutting down: exit immediately
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }

        let Some(tx) = SHUTDOWN_TX.get() else {
            std::process::exit(130);
        };

        crate::log!("watch"; "shutting down...");
        let _ = tx.send(());
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the actor system for graceful shutdown
pub fn register_shutdown(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the control endpoint so Ctrl+C unblocks its request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Unblock the registered control endpoint (actors stopped on their own).
pub fn stop_server() {
    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
