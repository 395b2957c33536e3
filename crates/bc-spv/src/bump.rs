//! BRC-74 block-wide unified merkle paths.
//!
//! A BUMP covers one block and carries, per tree level, only the leaves
//! that cannot be derived: the tracked txids at level 0, the siblings
//! their paths need, and duplicate-promotion markers where a level's
//! rightmost node pairs with itself. Everything else is recomputed.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use bc_primitives::chainhash::Hash;
use bc_primitives::util::{ByteReader, ByteWriter, VarInt};

use crate::error::SpvError;
use crate::merkle_tree_parent::merkle_tree_parent;

/// Payload of a single BUMP leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafKind {
    /// An intermediate hash required to reach the root.
    Real(Hash),
    /// The right sibling duplicates its pair (odd node count at this level).
    DuplicatePromote,
    /// A leaf the client tracks: a real hash flagged as a target txid.
    ClientTarget(Hash),
}

/// One entry in a BUMP level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BumpLeaf {
    /// Position within the tree level.
    pub offset: u64,
    /// What the leaf carries.
    pub kind: LeafKind,
}

impl BumpLeaf {
    /// The leaf's hash, absent for duplicate-promotion markers.
    pub fn hash(&self) -> Option<&Hash> {
        match &self.kind {
            LeafKind::Real(h) | LeafKind::ClientTarget(h) => Some(h),
            LeafKind::DuplicatePromote => None,
        }
    }

    /// Whether this leaf is flagged as a tracked txid.
    pub fn is_client_target(&self) -> bool {
        matches!(self.kind, LeafKind::ClientTarget(_))
    }

    fn flags(&self) -> u8 {
        match self.kind {
            LeafKind::Real(_) => 0,
            LeafKind::DuplicatePromote => 1,
            LeafKind::ClientTarget(_) => 2,
        }
    }
}

// JSON mirror: `{"offset":n,"hash":"…"}`, `{"offset":n,"duplicate":true}`,
// or `{"offset":n,"hash":"…","txid":true}`.
#[derive(Serialize, Deserialize)]
struct BumpLeafJson {
    offset: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    txid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duplicate: Option<bool>,
}

impl Serialize for BumpLeaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let json = match self.kind {
            LeafKind::Real(h) => BumpLeafJson {
                offset: self.offset,
                hash: Some(h),
                txid: None,
                duplicate: None,
            },
            LeafKind::ClientTarget(h) => BumpLeafJson {
                offset: self.offset,
                hash: Some(h),
                txid: Some(true),
                duplicate: None,
            },
            LeafKind::DuplicatePromote => BumpLeafJson {
                offset: self.offset,
                hash: None,
                txid: None,
                duplicate: Some(true),
            },
        };
        json.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BumpLeaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let json = BumpLeafJson::deserialize(deserializer)?;
        let kind = match (json.hash, json.duplicate.unwrap_or(false)) {
            (None, true) => LeafKind::DuplicatePromote,
            (Some(h), false) if json.txid.unwrap_or(false) => LeafKind::ClientTarget(h),
            (Some(h), false) => LeafKind::Real(h),
            _ => return Err(D::Error::custom("leaf must carry a hash or be a duplicate")),
        };
        Ok(BumpLeaf {
            offset: json.offset,
            kind,
        })
    }
}

/// A block-wide merkle path (BRC-74).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bump {
    /// Height of the block the paths prove into.
    pub block_height: u64,
    /// Tree levels, level 0 (leaves) first; each holds the non-derivable
    /// leaves at that level sorted by offset.
    pub path: Vec<Vec<BumpLeaf>>,
}

impl Bump {
    /// Decode from the BRC-74 binary form.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SpvError> {
        if data.len() < 37 {
            return Err(SpvError::InsufficientBumpData);
        }
        let mut reader = ByteReader::new(data);
        let block_height = reader.read_varint()?.value();
        let tree_height = reader.read_u8()? as usize;

        let mut path = Vec::with_capacity(tree_height);
        for _ in 0..tree_height {
            let n_leaves = reader.read_varint()?.value();
            if n_leaves == 0 {
                return Err(SpvError::InvalidLeafHeight);
            }
            let mut level = Vec::with_capacity(n_leaves as usize);
            for _ in 0..n_leaves {
                let offset = reader.read_varint()?.value();
                let kind = match reader.read_u8()? {
                    0 => LeafKind::Real(Hash::from_bytes(reader.read_bytes(32)?)?),
                    1 => LeafKind::DuplicatePromote,
                    2 => LeafKind::ClientTarget(Hash::from_bytes(reader.read_bytes(32)?)?),
                    _ => return Err(SpvError::InvalidMerkleFlags),
                };
                level.push(BumpLeaf { offset, kind });
            }
            level.sort_by_key(|leaf| leaf.offset);
            path.push(level);
        }

        Ok(Bump { block_height, path })
    }

    /// Decode from the hex form.
    pub fn from_hex(hex_str: &str) -> Result<Self, SpvError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }

    /// Encode to the BRC-74 binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.write_varint(VarInt(self.block_height));
        writer.write_u8(self.path.len() as u8);
        for level in &self.path {
            writer.write_varint(VarInt::from(level.len()));
            for leaf in level {
                writer.write_varint(VarInt(leaf.offset));
                writer.write_u8(leaf.flags());
                if let Some(hash) = leaf.hash() {
                    writer.write_bytes(hash.as_bytes());
                }
            }
        }
        writer.into_bytes()
    }

    /// Encode to hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Build the BUMP for leaf `tx_index` of a flat-array merkle tree (the
    /// [`crate::merkle_tree::build_merkle_tree_store_hashes`] form).
    ///
    /// Emits the sibling the path needs at every level, and at level 0 the
    /// tracked txid itself. Siblings falling on an absent slot become
    /// duplicate-promotion markers.
    pub fn from_merkle_tree_and_index(
        block_height: u64,
        merkle_tree: &[Option<Hash>],
        tx_index: u64,
    ) -> Result<Self, SpvError> {
        if merkle_tree.is_empty() {
            return Err(SpvError::EmptyMerkleTree);
        }

        let leaf_count = (merkle_tree.len() + 1) / 2;
        let txid = merkle_tree
            .get(tx_index as usize)
            .copied()
            .flatten()
            .ok_or(SpvError::IndexOutOfRange)?;

        if merkle_tree.len() == 1 {
            return Ok(Bump {
                block_height,
                path: vec![vec![BumpLeaf {
                    offset: 0,
                    kind: LeafKind::ClientTarget(txid),
                }]],
            });
        }

        let tree_height = leaf_count.trailing_zeros() as usize;
        let mut path = Vec::with_capacity(tree_height);
        let mut level_offset = 0usize;
        let mut level_width = leaf_count;

        for height in 0..tree_height {
            let offset = (tx_index >> height) ^ 1;
            let sibling_leaf = match merkle_tree[level_offset + offset as usize] {
                Some(hash) => BumpLeaf {
                    offset,
                    kind: LeafKind::Real(hash),
                },
                None => BumpLeaf {
                    offset,
                    kind: LeafKind::DuplicatePromote,
                },
            };

            if height == 0 {
                let txid_leaf = BumpLeaf {
                    offset: tx_index,
                    kind: LeafKind::ClientTarget(txid),
                };
                let mut level = if tx_index < offset {
                    vec![txid_leaf, sibling_leaf]
                } else {
                    vec![sibling_leaf, txid_leaf]
                };
                level.sort_by_key(|leaf| leaf.offset);
                path.push(level);
            } else {
                path.push(vec![sibling_leaf]);
            }

            level_offset += level_width;
            level_width >>= 1;
        }

        Ok(Bump { block_height, path })
    }

    /// Recompute the merkle root for a txid the BUMP covers at level 0.
    pub fn calculate_root_given_txid(&self, txid: &str) -> Result<String, SpvError> {
        let target = Hash::from_hex(txid)?;
        let level0 = self.path.first().ok_or(SpvError::InsufficientBumpData)?;

        // A single-transaction block: the txid is the root.
        if self.path.len() == 1 && level0.len() == 1 && level0[0].hash() == Some(&target) {
            return Ok(txid.to_string());
        }

        let index = level0
            .iter()
            .find(|leaf| leaf.hash() == Some(&target))
            .map(|leaf| leaf.offset)
            .ok_or_else(|| SpvError::TxidNotInBump(txid.to_string()))?;

        let indexed = IndexedLevels::new(&self.path);
        let mut working = target;
        for height in 0..self.path.len() {
            let offset = (index >> height) ^ 1;
            let sibling = indexed
                .leaf_at(height, offset)
                .ok_or(SpvError::NoHashAtIndex(height))?;
            working = match sibling {
                ResolvedLeaf::Duplicate => merkle_tree_parent(&working, &working),
                ResolvedLeaf::Hash(hash) => {
                    if offset & 1 == 1 {
                        merkle_tree_parent(&working, &hash)
                    } else {
                        merkle_tree_parent(&hash, &working)
                    }
                }
            };
        }

        Ok(working.to_string())
    }
}

enum ResolvedLeaf {
    Hash(Hash),
    Duplicate,
}

// Offset-indexed levels with recursive materialization: a missing leaf is
// derived from its two children when both are reachable.
struct IndexedLevels(Vec<HashMap<u64, BumpLeaf>>);

impl IndexedLevels {
    fn new(path: &[Vec<BumpLeaf>]) -> Self {
        IndexedLevels(
            path.iter()
                .map(|level| level.iter().map(|leaf| (leaf.offset, *leaf)).collect())
                .collect(),
        )
    }

    fn leaf_at(&self, level: usize, offset: u64) -> Option<ResolvedLeaf> {
        if let Some(leaf) = self.0[level].get(&offset) {
            return Some(match leaf.kind {
                LeafKind::DuplicatePromote => ResolvedLeaf::Duplicate,
                LeafKind::Real(h) | LeafKind::ClientTarget(h) => ResolvedLeaf::Hash(h),
            });
        }
        if level == 0 {
            return None;
        }

        let left = match self.leaf_at(level - 1, offset * 2)? {
            ResolvedLeaf::Hash(h) => h,
            ResolvedLeaf::Duplicate => return None,
        };
        let parent = match self.leaf_at(level - 1, offset * 2 + 1)? {
            ResolvedLeaf::Duplicate => merkle_tree_parent(&left, &left),
            ResolvedLeaf::Hash(right) => merkle_tree_parent(&left, &right),
        };
        Some(ResolvedLeaf::Hash(parent))
    }
}
