//! Hash function wrappers.
//!
//! Single and double SHA-256, the two digests Bitcoin-family chains use
//! for transaction IDs, block hashes, and merkle nodes.

use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Double SHA-256 (`sha256(sha256(data))`), the Hash256 used for txids,
/// block hashes, and merkle tree nodes.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}
