//! BRC-58 single-transaction merkle paths.
//!
//! A path is a leaf index plus the sibling hash at each tree level,
//! leaf level first. `path` is `None` for a single-transaction block,
//! where the txid already is the root.

use serde::{Deserialize, Serialize};

use bc_primitives::hash::sha256d;
use bc_primitives::util::{
    bytes_from_hex_reverse, hex_from_bytes_reverse, ByteReader, ByteWriter, VarInt,
};

use crate::error::SpvError;

/// A transaction's leaf position and its sibling hashes up the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// The transaction's leaf index within the block.
    pub index: u64,
    /// Sibling hashes in reversed hex, level 0 first; `None` when the
    /// transaction is the block's only leaf.
    pub path: Option<Vec<String>>,
}

impl MerklePath {
    /// Decode from the binary form `index(varint) ‖ nLeaves(varint) ‖
    /// leaves(32 bytes each, natural order)`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        let mut reader = ByteReader::new(bytes);
        let index = reader.read_varint()?.value();
        let n_leaves = reader.read_varint()?.value();

        let mut path = Vec::with_capacity(n_leaves as usize);
        for _ in 0..n_leaves {
            path.push(hex_from_bytes_reverse(reader.read_bytes(32)?));
        }

        Ok(MerklePath {
            index,
            path: if path.is_empty() { None } else { Some(path) },
        })
    }

    /// Decode from the hex form of the binary encoding.
    pub fn from_hex(hex_str: &str) -> Result<Self, SpvError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Encode to the binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpvError> {
        let branches = self.path.as_deref().unwrap_or(&[]);
        let mut writer = ByteWriter::new();
        writer.write_varint(VarInt(self.index));
        writer.write_varint(VarInt::from(branches.len()));
        for leaf in branches {
            writer.write_bytes(&bytes_from_hex_reverse(leaf)?);
        }
        Ok(writer.into_bytes())
    }

    /// Encode to hex.
    pub fn to_hex(&self) -> Result<String, SpvError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Replay the path from `txid` up to the merkle root.
    pub fn calculate_root(&self, txid: &str) -> Result<String, SpvError> {
        merkle_root_from_branches(
            txid,
            self.index as usize,
            self.path.as_deref().unwrap_or(&[]),
        )
    }
}

/// Hash a leaf up through its sibling branches to the root.
///
/// At each level the low bit of `index` says which side the working hash
/// sits on: odd puts it on the right of its sibling.
pub fn merkle_root_from_branches(
    leaf: &str,
    index: usize,
    branches: &[String],
) -> Result<String, SpvError> {
    let mut working = bytes_from_hex_reverse(leaf)?;
    let mut index = index;

    for branch in branches {
        let sibling = bytes_from_hex_reverse(branch)?;
        let mut digest = Vec::with_capacity(64);
        if index & 1 == 1 {
            digest.extend_from_slice(&sibling);
            digest.extend_from_slice(&working);
        } else {
            digest.extend_from_slice(&working);
            digest.extend_from_slice(&sibling);
        }
        working = sha256d(&digest).to_vec();
        index >>= 1;
    }

    Ok(hex_from_bytes_reverse(&working))
}

/// Extract the merkle path for leaf `index` from a flat-array tree.
pub fn get_tx_merkle_path(index: usize, merkle_tree: &[String]) -> Result<MerklePath, SpvError> {
    if merkle_tree.is_empty() {
        return Err(SpvError::EmptyMerkleTree);
    }
    let leaf_count = (merkle_tree.len() + 1) / 2;
    if index >= leaf_count || merkle_tree[index].is_empty() {
        return Err(SpvError::IndexOutOfRange);
    }
    // A single-transaction block has no path to walk.
    if merkle_tree.len() == 1 {
        return Ok(MerklePath {
            index: index as u64,
            path: None,
        });
    }
    Ok(MerklePath {
        index: index as u64,
        path: Some(path_elements(index, merkle_tree)),
    })
}

// The sibling at the current level is at index^1; an empty sibling means
// this leaf promotes itself. Recurse into the next level's subarray until
// only two leaves and the root remain.
fn path_elements(tx_index: usize, hashes: &[String]) -> Vec<String> {
    let sibling = &hashes[tx_index ^ 1];
    let mut path = vec![if sibling.is_empty() {
        hashes[tx_index].clone()
    } else {
        sibling.clone()
    }];

    if hashes.len() == 3 {
        return path;
    }

    path.extend(path_elements(tx_index / 2, &hashes[(hashes.len() + 1) / 2..]));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle_tree::build_merkle_tree_store;

    const PATH_BINARY_HEX: &str = "88040c82025f47b31054e9ad52109ef25b00fd9aaae7153564619bab031d4112f56c3b6ea708d7b84a078179b53cf2cb2f0636162ffd60a96f81815564bbc6c073cdefac0f077fca2a10730400da62ebaebaba852bd5fc3fb7770e090a1919d9c8b41e81e396da7f63e3989a8bc9bdbefddf95c75da1eb3936944b6a55cf82d87034";

    fn example_path() -> MerklePath {
        MerklePath {
            index: 136,
            path: Some(vec![
                "6cf512411d03ab9b61643515e7aa9afd005bf29e1052ade95410b3475f02820c".to_string(),
                "cd73c0c6bb645581816fa960fd2f1636062fcbf23cb57981074ab8d708a76e3b".to_string(),
                "b4c8d919190a090e77b73ffcd52b85babaaeeb62da000473102aca7f070facef".to_string(),
                "3470d882cf556a4b943639eba15dc795dffdbebdc98b9a98e3637fda96e3811e".to_string(),
            ]),
        }
    }

    fn five_txids() -> Vec<String> {
        [
            "b6d4d13aa08bb4b6cdb3b329cef29b5a5d55d85a85c330d56fddbce78d99c7d6",
            "426f65f6a6ce79c909e54d8959c874a767db3076e76031be70942b896cc64052",
            "adc23d36cc457d5847968c2e4d5f017a6f12a2f165102d10d2843f5276cfe68e",
            "728714bbbddd81a54cae473835ae99eb92ed78191327eb11a9d7494273dcad2a",
            "e3aa0230aa81abd483023886ad12790acf070e2a9f92d7f0ae3bebd90a904361",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn encodes_known_binary_vector() {
        assert_eq!(example_path().to_hex().unwrap(), PATH_BINARY_HEX);
    }

    #[test]
    fn decodes_known_binary_vector() {
        let decoded = MerklePath::from_hex(PATH_BINARY_HEX).unwrap();
        assert_eq!(decoded, example_path());
    }

    #[test]
    fn path_replays_to_tree_root() {
        let mut txids = five_txids();
        txids.extend(
            [
                "4848b9e94dd0e4f3173ebd6982ae7eb6b793de305d8450624b1d86c02a5c61d9",
                "912f77eefdd311e24f96850ed8e701381fc4943327f9cf73f9c4dec0d93a056d",
                "397fe2ae4d1d24efcc868a02daae42d1b419289d9a1ded3a5fe771efcc1219d9",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        let merkles = build_merkle_tree_store(&txids).unwrap();
        let expected = "1a1e779cd7dfc59f603b4e88842121001af822b2dc5d3b167ae66152e586a6b0";

        let path = get_tx_merkle_path(4, &merkles).unwrap();
        let root = merkle_root_from_branches(&txids[4], 4, path.path.as_deref().unwrap()).unwrap();
        assert_eq!(root, expected);

        let path = get_tx_merkle_path(3, &merkles).unwrap();
        assert_eq!(path.calculate_root(&txids[3]).unwrap(), expected);
    }

    #[test]
    fn odd_position_promotes_itself() {
        let txids = five_txids();
        let merkles = build_merkle_tree_store(&txids).unwrap();

        let path = get_tx_merkle_path(4, &merkles).unwrap();
        let root = path.calculate_root(&txids[4]).unwrap();
        assert_eq!(&root, merkles.last().unwrap());
    }

    #[test]
    fn single_transaction_block() {
        let txids = five_txids()[..1].to_vec();
        let merkles = build_merkle_tree_store(&txids).unwrap();

        let path = get_tx_merkle_path(0, &merkles).unwrap();
        assert_eq!(path.index, 0);
        assert_eq!(path.path, None);
        assert_eq!(path.calculate_root(&txids[0]).unwrap(), txids[0]);
        assert_eq!(
            serde_json::to_string(&path).unwrap(),
            "{\"index\":0,\"path\":null}"
        );
    }

    #[test]
    fn out_of_range_index_errors() {
        let txids = five_txids();
        let merkles = build_merkle_tree_store(&txids).unwrap();
        // Beyond the padded leaf row entirely.
        assert!(matches!(
            get_tx_merkle_path(8, &merkles),
            Err(SpvError::IndexOutOfRange)
        ));
        // Inside the padded row but pointing at a sentinel.
        assert!(matches!(
            get_tx_merkle_path(6, &merkles),
            Err(SpvError::IndexOutOfRange)
        ));
    }

    #[test]
    fn binary_round_trip_of_empty_path() {
        let path = MerklePath {
            index: 0,
            path: None,
        };
        let bytes = path.to_bytes().unwrap();
        assert_eq!(bytes, vec![0x00, 0x00]);
        assert_eq!(MerklePath::from_bytes(&bytes).unwrap(), path);
    }
}
