//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `autoinstall.toml` during watch mode.

use crate::config::AutoInstallConfig;
use crate::utils::hash::{ContentHash, hash_bytes};
use anyhow::Result;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<AutoInstallConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(AutoInstallConfig::default()));

/// Hash of the config file content currently loaded.
static CONFIG_HASH: Mutex<Option<ContentHash>> = Mutex::new(None);

#[inline]
pub fn cfg() -> Arc<AutoInstallConfig> {
    CONFIG.load_full()
}

/// Reload config from disk if content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
/// An invalid file leaves the current config in place.
pub fn reload_config() -> Result<bool> {
    use std::fs;

    let current = cfg();
    let content = match fs::read_to_string(&current.config_path) {
        Ok(content) => content,
        // Mid-save (replaced by rename): the next event brings it back.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let new_hash = hash_bytes(content.as_bytes());
    if *CONFIG_HASH.lock() == Some(new_hash) {
        return Ok(false);
    }

    let new_config = current.reload_from(&content)?;
    CONFIG.store(Arc::new(new_config));
    *CONFIG_HASH.lock() = Some(new_hash);

    Ok(true)
}

#[inline]
pub fn init_config(config: AutoInstallConfig) -> Arc<AutoInstallConfig> {
    use std::fs;

    if config.config_path.exists()
        && let Ok(content) = fs::read_to_string(&config.config_path)
    {
        *CONFIG_HASH.lock() = Some(hash_bytes(content.as_bytes()));
    }

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
