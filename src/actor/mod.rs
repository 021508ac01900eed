//! Actor System for Watch Mode
//!
//! Message-passing concurrency around the auto-install engine:
//!
//! ```text
//! FsActor ──▶ InstallerActor ◀── control endpoint
//! (notify)     (engine + timer)    (host signals)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `installer` - Serializes every signal into the engine
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod installer;
pub mod messages;

pub use coordinator::Coordinator;
