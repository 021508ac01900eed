//! What a changed path means for the source that owns it.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::core::{SourceId, SourceKind};
use crate::utils::hash::{ContentHash, hash_file};

/// The mutation surface a change landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Glyph outlines (`glyphs/*.glif`, `contents.plist`).
    Outline,
    /// `lib.plist`, which carries the glyph order.
    GlyphOrder,
    /// `fontinfo.plist` / `metainfo.plist`.
    Info,
    Kerning,
    Groups,
    Features,
    /// Layer list or a non-default layer directory.
    Layers,
    /// The `.designspace` document itself.
    Document,
}

impl Mutation {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::GlyphOrder => "glyph order",
            Self::Info => "info",
            Self::Kerning => "kerning",
            Self::Groups => "groups",
            Self::Features => "features",
            Self::Layers => "layers",
            Self::Document => "document",
        }
    }
}

/// Classify `path` relative to a watch root.
///
/// `root` is a UFO directory or a `.designspace` file. Paths that touch
/// nothing the compiler reads (images, data, editor state) yield `None`.
pub fn classify(root: &Path, path: &Path) -> Option<Mutation> {
    if path == root {
        return match SourceKind::from_path(root) {
            Some(SourceKind::DesignSpace) => Some(Mutation::Document),
            // Directory-level event: something inside changed.
            _ => Some(Mutation::Outline),
        };
    }

    let rel = path.strip_prefix(root).ok()?;
    let mut components = rel.components();
    let first = components.next()?.as_os_str().to_str()?;
    let nested = components.next().is_some();

    match first {
        "glyphs" => Some(Mutation::Outline),
        dir if dir.starts_with("glyphs.") => Some(Mutation::Layers),
        "layercontents.plist" => Some(Mutation::Layers),
        _ if nested => None,
        "lib.plist" => Some(Mutation::GlyphOrder),
        "fontinfo.plist" | "metainfo.plist" => Some(Mutation::Info),
        "kerning.plist" => Some(Mutation::Kerning),
        "groups.plist" => Some(Mutation::Groups),
        "features.fea" => Some(Mutation::Features),
        _ => None,
    }
}

/// Files this process wrote itself, keyed by the content it wrote and the
/// source whose build wrote them.
///
/// The next change event for such a file is dropped for that source only
/// when the file still hashes to what was written, so a build never
/// re-dirties its own source. Other owners of the file still see the change.
#[derive(Debug, Default)]
pub struct SelfWrites {
    pending: FxHashMap<PathBuf, (ContentHash, SourceId)>,
}

impl SelfWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: PathBuf, hash: ContentHash, writer: SourceId) {
        self.pending.insert(path, (hash, writer));
    }

    /// The source that wrote `path`, if its content is still what was
    /// written. A mismatch consumes the record.
    pub fn writer_of(&mut self, path: &Path) -> Option<SourceId> {
        let (expected, writer) = self.pending.get(path)?;
        match hash_file(path) {
            // Editors and the OS may report one write several times.
            Ok(actual) if actual == *expected => Some(writer.clone()),
            _ => {
                self.pending.remove(path);
                None
            }
        }
    }

    /// Forget everything below `root` (source closed or disabled).
    pub fn forget_under(&mut self, root: &Path) {
        self.pending.retain(|path, _| !path.starts_with(root));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::hash_bytes;

    #[test]
    fn test_classify_ufo_paths() {
        let root = Path::new("/fonts/Regular.ufo");
        let cases = [
            ("glyphs/a.glif", Some(Mutation::Outline)),
            ("glyphs/contents.plist", Some(Mutation::Outline)),
            ("glyphs.background/a.glif", Some(Mutation::Layers)),
            ("layercontents.plist", Some(Mutation::Layers)),
            ("lib.plist", Some(Mutation::GlyphOrder)),
            ("fontinfo.plist", Some(Mutation::Info)),
            ("metainfo.plist", Some(Mutation::Info)),
            ("kerning.plist", Some(Mutation::Kerning)),
            ("groups.plist", Some(Mutation::Groups)),
            ("features.fea", Some(Mutation::Features)),
            ("images/a.png", None),
            ("data/com.example/lib.plist", None),
        ];
        for (rel, expected) in cases {
            assert_eq!(classify(root, &root.join(rel)), expected, "{rel}");
        }
    }

    #[test]
    fn test_classify_designspace_document() {
        let root = Path::new("/fonts/Family.designspace");
        assert_eq!(classify(root, root), Some(Mutation::Document));
        assert_eq!(classify(root, Path::new("/fonts/Other.designspace")), None);
    }

    #[test]
    fn test_classify_outside_root() {
        let root = Path::new("/fonts/Regular.ufo");
        assert_eq!(classify(root, Path::new("/fonts/Bold.ufo/lib.plist")), None);
    }

    #[test]
    fn test_self_writes_match_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.glif");
        std::fs::write(&path, b"ours").unwrap();

        let ds = SourceId::new(dir.path().join("Fam.designspace"));
        let mut writes = SelfWrites::new();
        writes.record(path.clone(), hash_bytes(b"ours"), ds.clone());
        assert_eq!(writes.writer_of(&path), Some(ds.clone()));
        assert_eq!(writes.writer_of(&path), Some(ds));

        // The user edits the file afterwards: no longer ours.
        std::fs::write(&path, b"theirs").unwrap();
        assert_eq!(writes.writer_of(&path), None);
        assert!(writes.is_empty());
    }

    #[test]
    fn test_self_writes_forget_under() {
        let ds = SourceId::from_normalized(PathBuf::from("/a/Fam.designspace"));
        let mut writes = SelfWrites::new();
        writes.record(PathBuf::from("/a/Regular.ufo/glyphs/a.glif"), hash_bytes(b"x"), ds.clone());
        writes.record(PathBuf::from("/a/Bold.ufo/glyphs/a.glif"), hash_bytes(b"x"), ds);
        writes.forget_under(Path::new("/a/Regular.ufo"));
        assert_eq!(writes.len(), 1);
    }
}
