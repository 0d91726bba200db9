//! Cache keys derived from image URLs.

use std::fmt;

use sha2::{Digest, Sha256};

/// Fixed-length digest of an image URL, used as the volatile-tier key.
///
/// The URL text is hashed byte for byte. No normalization happens, so
/// `"https://a/x.png"` and `"https://a/x.png "` produce different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Length of the hex-encoded digest.
    pub const LEN: usize = 64;

    /// Compute the fingerprint of a URL.
    pub fn of(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        Self(hex::encode(digest))
    }

    /// Hex representation used as the storage key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
