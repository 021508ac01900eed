//! Core types - pure abstractions shared across the codebase.

mod source;
mod state;

pub use source::{SourceId, SourceKind};
pub use state::{
    is_shutdown, register_server, register_shutdown, setup_shutdown_handler, stop_server,
};
