use std::path::Path;

use super::types::DebouncedEvents;
use crate::actor::messages::InstallerMsg;

pub(super) fn log_events(events: &DebouncedEvents) {
    for (path, kind) in &events.0 {
        crate::debug!("watch"; "{}: {}", kind.label(), path.display());
    }
}

/// Convert DebouncedEvents to InstallerMsg(s).
///
/// A touched config file is reported on its own; every other path goes to
/// the engine, which decides which source (if any) owns it.
pub(super) fn events_to_messages(
    events: &DebouncedEvents,
    config_path: Option<&Path>,
) -> Vec<InstallerMsg> {
    let mut messages = Vec::new();
    let mut changed = Vec::new();
    let mut config_changed = false;

    for path in events.paths() {
        if config_path.is_some_and(|config| config == path) {
            config_changed = true;
        } else {
            changed.push(path.clone());
        }
    }

    // Reload first so the new settings apply to this batch of changes.
    if config_changed {
        messages.push(InstallerMsg::ConfigChanged);
    }
    if !changed.is_empty() {
        messages.push(InstallerMsg::Changed(changed));
    }
    messages
}
