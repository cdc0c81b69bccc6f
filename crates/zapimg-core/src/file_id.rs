//! File identifier generation
//!
//! Stored objects are named by a short opaque identifier drawn from a
//! cryptographically secure source: 4 random bytes, hex-encoded to 8
//! lowercase characters. Collisions are accepted as negligible rather than
//! checked (~4 billion values against a far smaller object count).

use rand::RngCore;

/// Number of random bytes behind each identifier.
const FILE_ID_BYTES: usize = 4;

/// Length of the encoded identifier in characters.
pub const FILE_ID_LEN: usize = FILE_ID_BYTES * 2;

/// Short opaque identifier for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    /// Generate a fresh identifier from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut buf = [0u8; FILE_ID_BYTES];
        rand::rng().fill_bytes(&mut buf);
        FileId(hex::encode(buf))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the stored filename: identifier plus the lowercased extension
    /// (with leading dot) of the original upload, e.g. `a1b2c3d4.jpg`.
    pub fn filename_with_extension(&self, extension: &str) -> String {
        let ext = extension.trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            self.0.clone()
        } else {
            format!("{}.{}", self.0, ext)
        }
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
