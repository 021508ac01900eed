//! `[control]` section configuration.
//!
//! The local HTTP endpoint that carries editor signals (activity, open,
//! save, ...) into watch mode.
//!
//! # Example
//!
//! ```toml
//! [control]
//! enable = true
//! interface = "127.0.0.1"
//! port = 5733
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub enable: bool,
    /// Network interface to bind. Keep it local: the endpoint is unauthenticated.
    pub interface: IpAddr,
    /// First port tried; the next free one is used when taken.
    pub port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enable: true,
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5733,
        }
    }
}
