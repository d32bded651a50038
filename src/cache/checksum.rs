//! Content fingerprints for change detection
//!
//! A checksum is the first 8 bytes of the SHA-256 digest, hex encoded.
//! It only has to tell two versions of a layer apart.

use sha2::{Digest, Sha256};

/// Checksum type: 16 lowercase hex characters
pub type Checksum = String;

/// Number of hex characters in a checksum
pub const CHECKSUM_LEN: usize = 16;

/// Fingerprint a cached value
pub fn fingerprint(content: &str) -> Checksum {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(&digest[..CHECKSUM_LEN / 2])
}

/// Rough token count used for prompt budgeting: one token per four chars, rounded up
pub fn estimate_tokens(content: &str) -> usize {
    content.chars().count().div_ceil(4)
}
