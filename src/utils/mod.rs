//! Shared utilities.

pub mod exec;
pub mod hash;
pub mod path;
pub mod plural;
pub mod slug;
