//! Actor Message Definitions
//!
//! ```text
//! FsActor ──Changed──▶ InstallerActor ◀──(host signals)── control endpoint
//!    ▲                      │
//!    └──────SetRoots────────┘
//! ```

use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::build::BatchReport;
use crate::engine::Status;
use crate::schedule::Activity;

// =============================================================================
// InstallerActor Messages
// =============================================================================

/// Messages to the Installer Actor
#[derive(Debug)]
pub enum InstallerMsg {
    /// Debounced filesystem changes under the watch roots
    Changed(Vec<PathBuf>),
    /// The config file changed on disk
    ConfigChanged,
    /// Generic editing activity
    Activity(Activity),
    /// Document opened in the host
    Opened(PathBuf),
    /// Document closed in the host
    Closed(PathBuf),
    /// Document saved in the host
    Saved(PathBuf),
    /// Host is about to become inactive
    ResignActive,
    /// Opt a source in
    Enable(PathBuf),
    /// Opt a source out
    Disable(PathBuf),
    /// Queue a design space for the next cycle
    Queue(PathBuf),
    /// Forced rebuild (empty = every enabled source)
    Reinstall {
        paths: Vec<PathBuf>,
        reply: Option<oneshot::Sender<BatchReport>>,
    },
    /// Snapshot request
    Status(oneshot::Sender<Status>),
    /// Stop, tearing down installs if configured
    Shutdown,
}

// =============================================================================
// FsActor Commands
// =============================================================================

/// Commands to the FileSystem Actor
#[derive(Debug)]
pub enum FsCmd {
    /// Replace the set of watched roots
    SetRoots(Vec<PathBuf>),
}
