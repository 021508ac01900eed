use std::path::{Path, PathBuf};

/// Turn source roots (plus the config file) into the set of paths to watch.
///
/// Files are watched through their parent directory, so saves that
/// replace the file (write temp + rename) keep being seen. Paths already
/// covered by a recursive watch on an ancestor are dropped.
pub(in crate::actor) fn collect_watch_paths(
    roots: &[PathBuf],
    config_path: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = roots
        .iter()
        .map(PathBuf::as_path)
        .chain(config_path)
        .map(|path| match path.parent() {
            Some(parent) if path.is_file() => parent.to_path_buf(),
            _ => path.to_path_buf(),
        })
        .collect();

    paths.sort();
    paths.dedup();
    dedupe_nested(&mut paths);
    paths
}

/// Drop paths that sit under another path in the set. Expects sorted input.
fn dedupe_nested(paths: &mut Vec<PathBuf>) {
    let mut kept: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths.drain(..) {
        if kept.last().is_some_and(|ancestor| path.starts_with(ancestor)) {
            continue;
        }
        kept.push(path);
    }
    *paths = kept;
}
