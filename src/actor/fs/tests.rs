use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::debouncer::{DEBOUNCE_MS, Debouncer};
use super::router::events_to_messages;
use super::types::{ChangeKind, DebouncedEvents};
use crate::actor::messages::InstallerMsg;

const GLIF: &str = "/fonts/Test.ufo/glyphs/a.glif";

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

#[test]
fn test_debouncer_empty() {
    let mut debouncer = Debouncer::new();
    assert!(!debouncer.is_ready());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec!["/fonts/A.ufo/glyphs/a.glif"], create_kind()));
    debouncer.add_event(&make_event(vec!["/fonts/A.ufo/glyphs/b.glif"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/fonts/A.ufo/glyphs/c.glif"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/fonts/A.ufo/glyphs/a.glif")],
        ChangeKind::Created
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/fonts/A.ufo/glyphs/b.glif")],
        ChangeKind::Modified
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/fonts/A.ufo/glyphs/c.glif")],
        ChangeKind::Removed
    );
}

#[test]
fn test_metadata_only_ignored() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec![GLIF], metadata_kind()));
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_temp_file_ignored() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec![GLIF], modify_kind()));
    let first_time = debouncer.last_event.unwrap();

    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(vec!["/fonts/Test.ufo/.a.glif.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/fonts/Test.ufo/fontinfo.plist~"], modify_kind()));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec![GLIF], create_kind()));
    debouncer.add_event(&make_event(vec![GLIF], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from(GLIF)], ChangeKind::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new();

    // Editors that save by replace emit remove followed by create.
    debouncer.add_event(&make_event(vec![GLIF], remove_kind()));
    debouncer.add_event(&make_event(vec![GLIF], create_kind()));
    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from(GLIF)], ChangeKind::Created);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec![GLIF], create_kind()));
    debouncer.add_event(&make_event(vec![GLIF], remove_kind()));
    assert!(debouncer.changes.is_empty(), "created+removed should discard");
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new();

    debouncer.add_event(&make_event(vec![GLIF], modify_kind()));
    debouncer.add_event(&make_event(vec![GLIF], remove_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from(GLIF)], ChangeKind::Removed);
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new();
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new();
    debouncer.last_event = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(DEBOUNCE_MS - 10));
    assert!(dur <= Duration::from_millis(DEBOUNCE_MS + 10));
}

#[test]
fn test_take_after_settle_window() {
    let mut debouncer = Debouncer::new();
    debouncer.add_event(&make_event(vec![GLIF], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 1));
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_events_sorted_by_path() {
    let events = DebouncedEvents::from_changes([
        (PathBuf::from("/fonts/B.ufo/glyphs/b.glif"), ChangeKind::Modified),
        (PathBuf::from("/fonts/A.ufo/glyphs/a.glif"), ChangeKind::Created),
    ]);
    let paths: Vec<_> = events.paths().cloned().collect();
    assert_eq!(
        paths,
        [
            PathBuf::from("/fonts/A.ufo/glyphs/a.glif"),
            PathBuf::from("/fonts/B.ufo/glyphs/b.glif"),
        ]
    );
}

#[test]
fn test_config_change_routed_first() {
    let config = PathBuf::from("/fonts/autoinstall.toml");
    let events = DebouncedEvents::from_changes([
        (PathBuf::from(GLIF), ChangeKind::Modified),
        (config.clone(), ChangeKind::Modified),
    ]);

    let messages = events_to_messages(&events, Some(&config));
    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[0], InstallerMsg::ConfigChanged));
    match &messages[1] {
        InstallerMsg::Changed(paths) => assert_eq!(paths, &[PathBuf::from(GLIF)]),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[test]
fn test_source_changes_without_config() {
    let events = DebouncedEvents::from_changes([(PathBuf::from(GLIF), ChangeKind::Removed)]);
    let messages = events_to_messages(&events, None);
    assert_eq!(messages.len(), 1);
    assert!(matches!(&messages[0], InstallerMsg::Changed(paths) if paths.len() == 1));

    let config = PathBuf::from("/fonts/autoinstall.toml");
    let only_config = DebouncedEvents::from_changes([(config.clone(), ChangeKind::Modified)]);
    let messages = events_to_messages(&only_config, Some(&config));
    assert_eq!(messages.len(), 1);
    assert!(matches!(messages[0], InstallerMsg::ConfigChanged));
}

#[test]
fn test_watch_roots_follow_desired_set() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = crate::utils::path::normalize_path(dir.path()).join("A.ufo");
    let b = crate::utils::path::normalize_path(dir.path()).join("B.ufo");
    std::fs::create_dir_all(&a).unwrap();
    std::fs::create_dir_all(&b).unwrap();

    let mut watcher = notify::recommended_watcher(|_: notify::Result<notify::Event>| {}).unwrap();
    let mut roots = super::watch_roots::WatchRoots::new(vec![a.clone()]);
    roots.attach_existing(&mut watcher).unwrap();
    assert!(roots.attached().contains(&a));

    roots.set_desired(vec![b.clone()], &mut watcher);
    assert!(!roots.attached().contains(&a));
    assert!(roots.attached().contains(&b));

    // Missing roots wait for `maintain`.
    let c = b.with_file_name("C.ufo");
    roots.set_desired(vec![b.clone(), c.clone()], &mut watcher);
    assert!(!roots.attached().contains(&c));
    std::fs::create_dir_all(&c).unwrap();
    roots.maintain(&mut watcher);
    assert!(roots.attached().contains(&c));
}
