//! Merkle tree construction over block transaction ids.
//!
//! Trees are stored as a flat linear array rather than a node structure:
//! for `n` txids the array holds `2 * next_power_of_two(n) - 1` slots,
//! leaves first, each level's parents following, the root in the last
//! slot. Absent leaves (when `n` is not a power of two) hold a sentinel;
//! a parent whose right child is absent hashes its left child with itself.

use bc_primitives::chainhash::Hash;
use bc_transaction::Transaction;

use crate::error::SpvError;
use crate::merkle_tree_parent::{merkle_tree_parent, merkle_tree_parent_str};

/// The power of two at or above `n`.
pub fn next_power_of_two(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        n.next_power_of_two()
    }
}

/// Build the flat-array merkle tree from reversed-hex txids.
///
/// Empty slots are the empty string; the root is the last element.
pub fn build_merkle_tree_store(txids: &[String]) -> Result<Vec<String>, SpvError> {
    if txids.is_empty() {
        return Err(SpvError::EmptyMerkleTree);
    }

    let next_pot = next_power_of_two(txids.len());
    let array_size = next_pot * 2 - 1;
    let mut merkles = vec![String::new(); array_size];
    merkles[..txids.len()].clone_from_slice(txids);

    let mut offset = next_pot;
    let mut i = 0;
    while i < array_size - 1 {
        if merkles[i].is_empty() {
            // No left child: the parent stays a sentinel too.
            merkles[offset] = String::new();
        } else if merkles[i + 1].is_empty() {
            merkles[offset] = merkle_tree_parent_str(&merkles[i], &merkles[i])?;
        } else {
            merkles[offset] = merkle_tree_parent_str(&merkles[i], &merkles[i + 1])?;
        }
        offset += 1;
        i += 2;
    }

    Ok(merkles)
}

/// The [`Hash`] flavor of [`build_merkle_tree_store`], using `None` as the
/// absent-leaf sentinel and skipping hex round trips.
pub fn build_merkle_tree_store_hashes(txids: &[Hash]) -> Vec<Option<Hash>> {
    if txids.is_empty() {
        return Vec::new();
    }

    let next_pot = next_power_of_two(txids.len());
    let array_size = next_pot * 2 - 1;
    let mut merkles: Vec<Option<Hash>> = vec![None; array_size];
    for (i, txid) in txids.iter().enumerate() {
        merkles[i] = Some(*txid);
    }

    let mut offset = next_pot;
    let mut i = 0;
    while i < array_size - 1 {
        merkles[offset] = match (&merkles[i], &merkles[i + 1]) {
            (None, _) => None,
            (Some(left), None) => Some(merkle_tree_parent(left, left)),
            (Some(left), Some(right)) => Some(merkle_tree_parent(left, right)),
        };
        offset += 1;
        i += 2;
    }

    merkles
}

/// The merkle root over `txids`.
pub fn build_merkle_root(txids: &[String]) -> Result<String, SpvError> {
    let merkles = build_merkle_tree_store(txids)?;
    merkles.last().cloned().ok_or(SpvError::EmptyMerkleTree)
}

/// Fold the coinbase hash up through `branches` to the root, all values in
/// natural byte order. Used when reconstructing a candidate block's root
/// from a mining job.
pub fn build_merkle_root_from_coinbase(
    coinbase_hash: &[u8],
    branches: &[String],
) -> Result<Vec<u8>, SpvError> {
    let mut acc = coinbase_hash.to_vec();
    for branch in branches {
        let mut concat = acc;
        concat.extend(hex::decode(branch)?);
        acc = bc_primitives::hash::sha256d(&concat).to_vec();
    }
    Ok(acc)
}

/// Parse raw transaction hex strings into their display-order txids.
pub fn txs_to_txids(txs: &[String]) -> Result<Vec<String>, SpvError> {
    txs.iter()
        .enumerate()
        .map(|(i, raw)| {
            let tx = Transaction::from_hex(raw)
                .map_err(|_| SpvError::InvalidTransaction(format!("at index {i}")))?;
            Ok(tx.tx_id_hex())
        })
        .collect()
}
