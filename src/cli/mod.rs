//! Command-line interface module.

mod args;
pub mod check;
pub mod common;
pub mod install;
pub mod status;
pub mod watch;

pub use args::{Cli, Commands};
