//! Control endpoint: a small local HTTP server that carries editor signals
//! (activity, open/close/save, app deactivation) and user commands into the
//! watch-mode actor system. See `routes` for the request table.

mod response;
pub mod routes;

#[cfg(test)]
mod tests;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tiny_http::{Request, Server};
use tokio::sync::{mpsc, oneshot};

use crate::actor::messages::InstallerMsg;
use crate::log;
use routes::Route;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Worker threads for requests; `/reinstall` blocks one for a whole batch.
const REQUEST_THREADS: usize = 2;

/// Bound server ready to accept requests
pub struct ControlServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<ControlServer> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("control"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 asks the OS; report what it picked.
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok(ControlServer {
                    server: Arc::new(server),
                    addr,
                });
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

impl ControlServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared handle, used to unblock the request loop on shutdown.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Run the request loop on its own thread.
    pub fn spawn(self, installer_tx: mpsc::Sender<InstallerMsg>) -> Result<JoinHandle<()>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("control-{i}"))
            .build()
            .context("failed to create control thread pool")?;

        Ok(thread::spawn(move || {
            for request in self.server.incoming_requests() {
                let tx = installer_tx.clone();
                pool.spawn(move || {
                    if let Err(e) = handle_request(request, &tx) {
                        log!("control"; "request error: {e}");
                    }
                });
            }
            crate::debug!("control"; "stopped");
        }))
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, tx: &mpsc::Sender<InstallerMsg>) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let route = match routes::parse(request.method(), request.url()) {
        Ok(route) => route,
        Err(e) => return response::respond_error(request, e.status(), &e.to_string()),
    };
    crate::debug!("control"; "{} {}", request.method(), request.url());

    match route {
        Route::Signal(msg) => {
            if tx.blocking_send(msg).is_err() {
                return response::respond_unavailable(request);
            }
            response::respond_accepted(request)
        }
        Route::Reinstall(paths) => {
            let (reply, rx) = oneshot::channel();
            let msg = InstallerMsg::Reinstall {
                paths,
                reply: Some(reply),
            };
            match tx.blocking_send(msg).ok().and_then(|()| rx.blocking_recv().ok()) {
                Some(report) => response::respond_json(request, 200, &response::report_body(&report)),
                None => response::respond_unavailable(request),
            }
        }
        Route::Status => {
            let (reply, rx) = oneshot::channel();
            match tx
                .blocking_send(InstallerMsg::Status(reply))
                .ok()
                .and_then(|()| rx.blocking_recv().ok())
            {
                Some(status) => response::respond_json(request, 200, &status),
                None => response::respond_unavailable(request),
            }
        }
    }
}
