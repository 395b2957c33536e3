//! TSC merkle inclusion proofs.
//!
//! A proof carries the subject transaction (txid or full raw tx), a target
//! to anchor against (block hash, 80-byte header, or bare merkle root),
//! and the sibling nodes to replay. In the JSON node list, `"*"` marks a
//! duplicated right sibling and `"?"` a client-supplied hash; the binary
//! form tags each node with a type byte instead.

use serde::{Deserialize, Serialize};

use bc_primitives::hash::sha256d;
use bc_primitives::util::{
    bytes_from_hex_reverse, hex_from_bytes_reverse, ByteReader, ByteWriter, VarInt,
};

use crate::block_header::BlockHeader;
use crate::error::SpvError;
use crate::header_chain::BlockHeaderChain;
use crate::merkle_tree_parent::merkle_tree_parent_str;

/// Node marker for a duplicated sibling.
pub const NODE_DUPLICATE: &str = "*";
/// Node marker for a hash the verifying client must supply.
pub const NODE_CLIENT_HASH: &str = "?";

// Flag-byte layout.
const FLAG_FULL_TX: u8 = 0x01;
const FLAG_TARGET_MASK: u8 = 0x06;
const FLAG_TARGET_HASH: u8 = 0x00;
const FLAG_TARGET_HEADER: u8 = 0x02;
const FLAG_TARGET_ROOT: u8 = 0x04;
const FLAG_COMPOSITE: u8 = 0x08;
const FLAG_PROOF_TYPE: u8 = 0x10;

/// Target type string for a block-hash target.
pub const TARGET_TYPE_HASH: &str = "hash";
/// Target type string for an 80-byte header target.
pub const TARGET_TYPE_HEADER: &str = "header";
/// Target type string for a bare merkle-root target.
pub const TARGET_TYPE_MERKLE_ROOT: &str = "merkleRoot";

/// A TSC-format merkle inclusion proof for a single transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The transaction's leaf index within the block.
    pub index: u64,

    /// Either the 64-character txid, or the full raw transaction hex when
    /// the proof embeds the transaction.
    #[serde(rename = "txOrId")]
    pub tx_or_id: String,

    /// The anchoring target: block hash, header hex, or merkle root,
    /// disambiguated by `target_type` and length.
    pub target: String,

    /// Sibling nodes in reversed hex, or the `"*"` / `"?"` markers.
    pub nodes: Vec<String>,

    /// One of `"hash"`, `"header"`, `"merkleRoot"`; absent means `"hash"`.
    #[serde(
        rename = "targetType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_type: Option<String>,

    /// Proof type; absent means a merkle branch, the only supported kind.
    #[serde(rename = "proofType", default, skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<String>,

    /// Composite-proof flag; composite proofs are not supported.
    #[serde(default, skip_serializing_if = "is_false")]
    pub composite: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl MerkleProof {
    /// The subject txid. Errors when the proof embeds a full transaction.
    pub fn txid(&self) -> Result<&str, SpvError> {
        if self.tx_or_id.len() > 64 {
            return Err(SpvError::ExpectingTxidButGotTx);
        }
        Ok(&self.tx_or_id)
    }

    /// The embedded raw transaction hex. Errors when only a txid is carried.
    pub fn tx_hex(&self) -> Result<&str, SpvError> {
        if self.tx_or_id.len() <= 64 {
            return Err(SpvError::ExpectingTxButGotTxid);
        }
        Ok(&self.tx_or_id)
    }

    /// The subject txid, deriving it from the embedded transaction when
    /// necessary. Validates the txOrId length rules.
    pub fn derive_txid(&self) -> Result<String, SpvError> {
        if self.tx_or_id.is_empty() {
            return Err(SpvError::MissingTxidInProof);
        }
        if self.tx_or_id.len() < 64 {
            return Err(SpvError::InvalidTxOrIdLength);
        }
        if self.tx_or_id.len() == 64 {
            return Ok(self.tx_or_id.clone());
        }
        let raw = hex::decode(&self.tx_or_id)?;
        if raw.len() <= 32 {
            return Err(SpvError::InvalidTxLength);
        }
        Ok(hex_from_bytes_reverse(&sha256d(&raw)))
    }

    fn target_flags(&self) -> Result<u8, SpvError> {
        match self.target_type.as_deref() {
            None | Some(TARGET_TYPE_HASH) => Ok(FLAG_TARGET_HASH),
            Some(TARGET_TYPE_HEADER) => Ok(FLAG_TARGET_HEADER),
            Some(TARGET_TYPE_MERKLE_ROOT) => Ok(FLAG_TARGET_ROOT),
            Some(_) => Err(SpvError::InvalidTargetType),
        }
    }

    /// Encode to the TSC binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpvError> {
        let mut flags = self.target_flags()?;
        let full_tx = self.tx_or_id.len() > 64;
        if full_tx {
            flags |= FLAG_FULL_TX;
        }
        if self.composite {
            flags |= FLAG_COMPOSITE;
        }
        if let Some(proof_type) = &self.proof_type {
            if proof_type != "branch" {
                flags |= FLAG_PROOF_TYPE;
            }
        }

        let mut writer = ByteWriter::new();
        writer.write_u8(flags);
        writer.write_varint(VarInt(self.index));

        if full_tx {
            let raw = hex::decode(&self.tx_or_id)?;
            writer.write_varint(VarInt::from(raw.len()));
            writer.write_bytes(&raw);
        } else {
            if self.tx_or_id.len() != 64 {
                return Err(SpvError::InvalidTxOrIdLength);
            }
            writer.write_bytes(&bytes_from_hex_reverse(&self.tx_or_id)?);
        }

        if flags & FLAG_TARGET_MASK == FLAG_TARGET_HEADER {
            let header = hex::decode(&self.target)?;
            if header.len() != 80 {
                return Err(SpvError::InvalidTarget);
            }
            writer.write_bytes(&header);
        } else {
            if self.target.len() != 64 {
                return Err(SpvError::InvalidTarget);
            }
            writer.write_bytes(&bytes_from_hex_reverse(&self.target)?);
        }

        writer.write_varint(VarInt::from(self.nodes.len()));
        for node in &self.nodes {
            match node.as_str() {
                NODE_DUPLICATE => writer.write_u8(1),
                NODE_CLIENT_HASH => writer.write_u8(2),
                hash => {
                    writer.write_u8(0);
                    writer.write_bytes(&bytes_from_hex_reverse(hash)?);
                }
            }
        }

        Ok(writer.into_bytes())
    }

    /// Encode to hex.
    pub fn to_hex(&self) -> Result<String, SpvError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Decode from the TSC binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        let mut reader = ByteReader::new(bytes);
        let flags = reader.read_u8()?;
        let index = reader.read_varint()?.value();

        let tx_or_id = if flags & FLAG_FULL_TX != 0 {
            let len = reader.read_varint()?.value() as usize;
            if len <= 32 {
                return Err(SpvError::InvalidTxLength);
            }
            hex::encode(reader.read_bytes(len)?)
        } else {
            hex_from_bytes_reverse(reader.read_bytes(32)?)
        };

        let (target, target_type) = match flags & FLAG_TARGET_MASK {
            FLAG_TARGET_HASH => (
                hex_from_bytes_reverse(reader.read_bytes(32)?),
                TARGET_TYPE_HASH,
            ),
            FLAG_TARGET_HEADER => (hex::encode(reader.read_bytes(80)?), TARGET_TYPE_HEADER),
            FLAG_TARGET_ROOT => (
                hex_from_bytes_reverse(reader.read_bytes(32)?),
                TARGET_TYPE_MERKLE_ROOT,
            ),
            _ => return Err(SpvError::InvalidMerkleFlags),
        };

        let node_count = reader.read_varint()?.value();
        let mut nodes = Vec::with_capacity(node_count as usize);
        for _ in 0..node_count {
            match reader.read_u8()? {
                0 => nodes.push(hex_from_bytes_reverse(reader.read_bytes(32)?)),
                1 => nodes.push(NODE_DUPLICATE.to_string()),
                2 => nodes.push(NODE_CLIENT_HASH.to_string()),
                _ => return Err(SpvError::InvalidNodeType),
            }
        }

        Ok(MerkleProof {
            index,
            tx_or_id,
            target,
            nodes,
            target_type: Some(target_type.to_string()),
            proof_type: if flags & FLAG_PROOF_TYPE != 0 {
                Some("tree".to_string())
            } else {
                None
            },
            composite: flags & FLAG_COMPOSITE != 0,
        })
    }

    /// Decode from hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, SpvError> {
        Self::from_bytes(&hex::decode(hex_str)?)
    }
}

/// Verifies TSC merkle proofs against an injected block-header chain.
pub struct MerkleProofVerifier<C> {
    chain: C,
}

impl<C: BlockHeaderChain> MerkleProofVerifier<C> {
    /// A verifier resolving targets through `chain`.
    pub fn new(chain: C) -> Self {
        MerkleProofVerifier { chain }
    }

    /// Check a proof end to end: validate its shape, resolve the expected
    /// merkle root from the target, and replay the branch. `Ok(false)`
    /// means well-formed but not landing on the expected root.
    pub fn verify_merkle_proof(&self, proof: &MerkleProof) -> Result<bool, SpvError> {
        if proof.composite {
            return Err(SpvError::OnlySingleProofSupported);
        }
        if let Some(proof_type) = proof.proof_type.as_deref() {
            if proof_type != "branch" {
                return Err(SpvError::OnlyMerkleBranchSupported);
            }
        }

        let txid = proof.derive_txid()?;
        let expected_root = self.expected_merkle_root(proof)?;
        let computed_root = replay_branches(&txid, proof.index, &proof.nodes)?;
        Ok(computed_root == expected_root)
    }

    // Resolve the merkle root the proof must land on. Block-hash and
    // header targets go through the header chain so the block is known;
    // a bare merkle-root target is trusted as supplied.
    fn expected_merkle_root(&self, proof: &MerkleProof) -> Result<String, SpvError> {
        if proof.target.is_empty() {
            return Err(SpvError::MissingRootInProof);
        }
        match proof.target_type.as_deref() {
            None | Some(TARGET_TYPE_HASH) => {
                if proof.target.len() != 64 {
                    return Err(SpvError::InvalidTarget);
                }
                let header = self.chain.block_header(&proof.target)?;
                Ok(header.hash_merkle_root_hex())
            }
            Some(TARGET_TYPE_HEADER) => {
                if proof.target.len() != 160 {
                    return Err(SpvError::InvalidTarget);
                }
                let supplied = BlockHeader::from_hex(&proof.target)?;
                let header = self.chain.block_header(&supplied.hash_hex())?;
                Ok(header.hash_merkle_root_hex())
            }
            Some(TARGET_TYPE_MERKLE_ROOT) => {
                if proof.target.len() != 64 {
                    return Err(SpvError::InvalidTarget);
                }
                Ok(proof.target.clone())
            }
            Some(_) => Err(SpvError::InvalidTargetType),
        }
    }
}

// Replay the sibling nodes from the leaf. A "*" sibling duplicates the
// working hash and is only legal on the right-hand side.
fn replay_branches(txid: &str, index: u64, nodes: &[String]) -> Result<String, SpvError> {
    let mut working = txid.to_string();
    let mut index = index;

    for node in nodes {
        working = match node.as_str() {
            NODE_DUPLICATE => {
                if index & 1 == 1 {
                    return Err(SpvError::InvalidNodes);
                }
                merkle_tree_parent_str(&working, &working)?
            }
            NODE_CLIENT_HASH => return Err(SpvError::InvalidNodes),
            sibling if index & 1 == 1 => merkle_tree_parent_str(sibling, &working)?,
            sibling => merkle_tree_parent_str(&working, sibling)?,
        };
        index >>= 1;
    }

    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle_path::get_tx_merkle_path;
    use crate::merkle_tree::build_merkle_tree_store;

    use std::collections::HashMap;

    struct MapChain(HashMap<String, BlockHeader>);

    impl BlockHeaderChain for MapChain {
        fn block_header(&self, block_hash_hex: &str) -> Result<BlockHeader, SpvError> {
            self.0
                .get(block_hash_hex)
                .cloned()
                .ok_or_else(|| SpvError::InvalidAncestry(format!("unknown block {block_hash_hex}")))
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

    // A proof for leaf `index` of the five-tx block, plus a header whose
    // merkle root commits to that block.
    fn proof_and_header(index: usize) -> (MerkleProof, BlockHeader) {
        let txids = five_txids();
        let merkles = build_merkle_tree_store(&txids).unwrap();
        let path = get_tx_merkle_path(index, &merkles).unwrap();

        let root = merkles.last().unwrap();
        let header = BlockHeader {
            version: 0x2000_0000,
            time: 1_700_000_000,
            nonce: 42,
            hash_prev_block: [0u8; 32],
            hash_merkle_root: hex::decode(root).unwrap().try_into().unwrap(),
            bits: [0x20, 0x7f, 0xff, 0xff],
        };

        let proof = MerkleProof {
            index: path.index,
            tx_or_id: txids[index].clone(),
            target: header.hash_hex(),
            nodes: path.path.unwrap_or_default(),
            target_type: Some(TARGET_TYPE_HASH.to_string()),
            proof_type: None,
            composite: false,
        };
        (proof, header)
    }

    fn chain_for(header: &BlockHeader) -> MapChain {
        let mut map = HashMap::new();
        map.insert(header.hash_hex(), header.clone());
        MapChain(map)
    }

    #[test]
    fn verifies_against_block_hash_target() {
        for index in 0..5 {
            let (proof, header) = proof_and_header(index);
            let verifier = MerkleProofVerifier::new(chain_for(&header));
            assert!(verifier.verify_merkle_proof(&proof).unwrap(), "index {index}");
        }
    }

    #[test]
    fn verifies_against_header_target() {
        let (mut proof, header) = proof_and_header(2);
        proof.target = header.to_hex();
        proof.target_type = Some(TARGET_TYPE_HEADER.to_string());
        let verifier = MerkleProofVerifier::new(chain_for(&header));
        assert!(verifier.verify_merkle_proof(&proof).unwrap());
    }

    #[test]
    fn verifies_against_merkle_root_target() {
        let (mut proof, header) = proof_and_header(4);
        proof.target = header.hash_merkle_root_hex();
        proof.target_type = Some(TARGET_TYPE_MERKLE_ROOT.to_string());
        let verifier = MerkleProofVerifier::new(chain_for(&header));
        assert!(verifier.verify_merkle_proof(&proof).unwrap());
    }

    #[test]
    fn wrong_leaf_fails_cleanly() {
        let (mut proof, header) = proof_and_header(1);
        // Swap in a different txid: the replay lands elsewhere.
        proof.tx_or_id = five_txids()[0].clone();
        let verifier = MerkleProofVerifier::new(chain_for(&header));
        assert!(!verifier.verify_merkle_proof(&proof).unwrap());
    }

    #[test]
    fn embedded_transaction_derives_txid() {
        let coinbase = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";
        let proof = MerkleProof {
            tx_or_id: coinbase.to_string(),
            ..Default::default()
        };
        assert_eq!(
            proof.derive_txid().unwrap(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert!(matches!(proof.txid(), Err(SpvError::ExpectingTxidButGotTx)));
        assert!(proof.tx_hex().is_ok());
    }

    #[test]
    fn shape_validation() {
        let (proof, header) = proof_and_header(0);
        let verifier = MerkleProofVerifier::new(chain_for(&header));

        let composite = MerkleProof {
            composite: true,
            ..proof.clone()
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&composite),
            Err(SpvError::OnlySingleProofSupported)
        ));

        let tree_proof = MerkleProof {
            proof_type: Some("tree".to_string()),
            ..proof.clone()
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&tree_proof),
            Err(SpvError::OnlyMerkleBranchSupported)
        ));

        let short = MerkleProof {
            tx_or_id: "abcd".to_string(),
            ..proof.clone()
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&short),
            Err(SpvError::InvalidTxOrIdLength)
        ));

        let empty = MerkleProof {
            tx_or_id: String::new(),
            ..proof.clone()
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&empty),
            Err(SpvError::MissingTxidInProof)
        ));

        let no_target = MerkleProof {
            target: String::new(),
            ..proof.clone()
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&no_target),
            Err(SpvError::MissingRootInProof)
        ));

        let bad_type = MerkleProof {
            target_type: Some("coinbase".to_string()),
            ..proof
        };
        assert!(matches!(
            verifier.verify_merkle_proof(&bad_type),
            Err(SpvError::InvalidTargetType)
        ));
    }

    #[test]
    fn duplicate_marker_on_left_is_invalid() {
        assert!(matches!(
            replay_branches(&five_txids()[0], 1, &[NODE_DUPLICATE.to_string()]),
            Err(SpvError::InvalidNodes)
        ));
        // On the right it promotes the working hash.
        let promoted = replay_branches(&five_txids()[0], 0, &[NODE_DUPLICATE.to_string()]).unwrap();
        assert_eq!(
            promoted,
            merkle_tree_parent_str(&five_txids()[0], &five_txids()[0]).unwrap()
        );
    }

    #[test]
    fn binary_round_trip() {
        let (proof, _) = proof_and_header(3);
        let bytes = proof.to_bytes().unwrap();
        let decoded = MerkleProof::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.index, proof.index);
        assert_eq!(decoded.tx_or_id, proof.tx_or_id);
        assert_eq!(decoded.target, proof.target);
        assert_eq!(decoded.nodes, proof.nodes);
        assert_eq!(decoded.target_type.as_deref(), Some(TARGET_TYPE_HASH));
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn binary_rejects_unknown_node_type() {
        let (proof, _) = proof_and_header(0);
        let mut bytes = proof.to_bytes().unwrap();
        // Corrupt the first node's type byte (flags + index + txid + target + count).
        let node_type_at = 1 + 1 + 32 + 32 + 1;
        bytes[node_type_at] = 9;
        assert!(matches!(
            MerkleProof::from_bytes(&bytes),
            Err(SpvError::InvalidNodeType)
        ));
    }

    #[test]
    fn json_shape() {
        let (proof, _) = proof_and_header(0);
        let json = serde_json::to_string(&proof).unwrap();
        assert!(json.contains("\"txOrId\""));
        assert!(json.contains("\"targetType\":\"hash\""));
        assert!(!json.contains("composite"));
        assert!(!json.contains("proofType"));
        let back: MerkleProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
    }
}
