//! Content hashing using blake3.
//!
//! Used to name artifacts by content (identical rebuilds land on the same
//! path) and to recognise files this process wrote itself.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// First `len` hex characters, for file names.
    pub fn short(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len);
        hex
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", self.short(16))
    }
}

/// Hash an in-memory buffer.
#[inline]
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash(*blake3::hash(data).as_bytes())
}

/// Hash a file's contents, streaming.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(ContentHash(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.otf");
        std::fs::write(&path, b"OTTO binary").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"OTTO binary"));
    }

    #[test]
    fn test_hash_file_missing() {
        assert!(hash_file(Path::new("/nonexistent/file.otf")).is_err());
    }

    #[test]
    fn test_short_hex() {
        let hash = hash_bytes(b"x");
        assert_eq!(hash.short(16).len(), 16);
        assert!(hash.to_hex().starts_with(&hash.short(8)));
        assert_eq!(format!("{hash}"), hash.short(16));
    }
}
