//! Merkle tree parent hashing.
//!
//! A parent node is the Hash256 of its children concatenated in natural
//! byte order. Three flavors cover the call sites: [`Hash`] values,
//! display-order byte slices, and reversed-hex strings.

use bc_primitives::chainhash::Hash;
use bc_primitives::hash::sha256d;
use bc_primitives::util::reverse_bytes;

/// Parent of two natural-order child hashes.
pub fn merkle_tree_parent(left: &Hash, right: &Hash) -> Hash {
    let mut concatenated = [0u8; 64];
    concatenated[..32].copy_from_slice(left.as_bytes());
    concatenated[32..].copy_from_slice(right.as_bytes());
    Hash::new(sha256d(&concatenated))
}

/// Parent of two display-order byte slices, returned in display order.
pub fn merkle_tree_parent_bytes(left: &[u8], right: &[u8]) -> Vec<u8> {
    let mut concatenated = Vec::with_capacity(left.len() + right.len());
    concatenated.extend(left.iter().rev());
    concatenated.extend(right.iter().rev());
    reverse_bytes(&sha256d(&concatenated))
}

/// Parent of two reversed-hex strings, returned as reversed hex.
pub fn merkle_tree_parent_str(left: &str, right: &str) -> Result<String, hex::FromHexError> {
    let l = hex::decode(left)?;
    let r = hex::decode(right)?;
    Ok(hex::encode(merkle_tree_parent_bytes(&l, &r)))
}
