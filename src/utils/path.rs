//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_path` - resolve relative paths against a base directory
//! - `expand_path` - `~` expansion for configured directories

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a possibly relative path against `base_dir`, then normalize.
#[inline]
pub fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    normalize_path(&base_dir.join(path))
}

/// Expand a leading `~` and resolve the result against `base_dir`.
pub fn expand_path(path: &Path, base_dir: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde(&raw);
    resolve_path(Path::new(expanded.as_ref()), base_dir)
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/Font.ufo");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/Font.ufo");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_resolve_path_relative_to_base() {
        let resolved = resolve_path(Path::new("masters/Light.ufo"), Path::new("/fonts/family"));
        assert_eq!(resolved, PathBuf::from("/fonts/family/masters/Light.ufo"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path(Path::new("~/fonts"), Path::new("/base"));
        assert!(expanded.is_absolute());
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("/a/.DS_Store")));
        assert!(is_temp_file(Path::new("/a/glyph.glif~")));
        assert!(is_temp_file(Path::new("/a/fontinfo.plist.swp")));
        assert!(!is_temp_file(Path::new("/a/glyphs/a.glif")));
    }
}
