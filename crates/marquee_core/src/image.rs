//! Source image references.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Reference to a source poster image.
///
/// The content hash doubles as the poster identifier: re-processing the same
/// file yields the same hash, which is what makes graph writes idempotent
/// across runs.
///
/// # Examples
///
/// ```
/// use marquee_core::ImageRef;
///
/// let image = ImageRef::from_bytes("poster.jpg", b"fake image bytes");
/// assert_eq!(image.content_hash.len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// Filesystem path to the image
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the file contents (poster identifier)
    pub content_hash: String,
}

impl ImageRef {
    /// Read an image file and compute its content hash.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file is missing or unreadable.
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(path, &bytes))
    }

    /// Build a reference from already-loaded bytes.
    pub fn from_bytes<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let content_hash = format!("{:x}", hasher.finalize());
        Self {
            path: path.as_ref().to_path_buf(),
            content_hash,
        }
    }

    /// Short form of the hash for entity naming and log fields.
    pub fn short_hash(&self) -> &str {
        &self.content_hash[..self.content_hash.len().min(12)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_hash() {
        let a = ImageRef::from_bytes("a.jpg", b"poster");
        let b = ImageRef::from_bytes("b.jpg", b"poster");
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn different_bytes_different_hash() {
        let a = ImageRef::from_bytes("a.jpg", b"poster one");
        let b = ImageRef::from_bytes("a.jpg", b"poster two");
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn missing_file_errors() {
        assert!(ImageRef::from_path("/nonexistent/poster.jpg").is_err());
    }
}
