//! Ancestry envelope JSON forms and the binary v1 codec.
//!
//! Two JSON shapes exist for the same evidence. The nested form keys each
//! node's parents by txid, which is what verification wants to traverse.
//! The flat TSC form is the standard wire list of ancestors. Both convert
//! to and from the shared binary v1 encoding.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use bc_primitives::util::{ByteWriter, VarInt};
use bc_transaction::Transaction;

use crate::error::SpvError;
use crate::mapi_callback::MapiCallback;
use crate::merkle_proof::MerkleProof;

use super::binary::{parse_ancestry, Ancestor, ANCESTRY_VERSION, FLAG_MAPI, FLAG_PROOF, FLAG_TX};

/// One node of the nested ancestry graph.
///
/// A node is anchored when it carries a proof; otherwise every input of
/// its transaction must resolve to an entry in `parents`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AncestryJson {
    /// The node's transaction id (reversed hex). May be omitted in stored
    /// fixtures; it is derivable from `raw_tx`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub txid: String,

    /// The raw transaction hex.
    #[serde(rename = "rawTx", default, skip_serializing_if = "String::is_empty")]
    pub raw_tx: String,

    /// The merkle proof anchoring this transaction, when mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<MerkleProof>,

    /// Merchant-API callbacks attached to this transaction.
    #[serde(
        rename = "mapiResponses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mapi_responses: Option<Vec<MapiCallback>>,

    /// Parents funding this transaction's inputs, keyed by txid.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parents: BTreeMap<String, AncestryJson>,
}

impl AncestryJson {
    /// Serialize the whole graph to ancestry binary v1.
    ///
    /// Ancestors are deduplicated by txid and written parents-first, so
    /// every transaction appears after the ones funding it and the tip
    /// lands last.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpvError> {
        let mut writer = ByteWriter::new();
        writer.write_u8(ANCESTRY_VERSION);
        let mut seen = HashSet::new();
        self.write_node(&mut writer, &mut seen)?;
        Ok(writer.into_bytes())
    }

    fn write_node(
        &self,
        writer: &mut ByteWriter,
        seen: &mut HashSet<String>,
    ) -> Result<(), SpvError> {
        for parent in self.parents.values() {
            parent.write_node(writer, seen)?;
        }

        let raw_tx = hex::decode(&self.raw_tx)?;
        let txid = if self.txid.is_empty() {
            Transaction::from_bytes(&raw_tx)?.tx_id_hex()
        } else {
            self.txid.clone()
        };
        if !seen.insert(txid) {
            return Ok(());
        }

        writer.write_u8(FLAG_TX);
        writer.write_varint(VarInt::from(raw_tx.len()));
        writer.write_bytes(&raw_tx);

        if let Some(proof) = &self.proof {
            let proof_bytes = proof.to_bytes()?;
            writer.write_u8(FLAG_PROOF);
            writer.write_varint(VarInt::from(proof_bytes.len()));
            writer.write_bytes(&proof_bytes);
        }

        if let Some(mapi_responses) = &self.mapi_responses {
            if !mapi_responses.is_empty() {
                writer.write_u8(FLAG_MAPI);
                writer.write_varint(VarInt::from(mapi_responses.len()));
                for response in mapi_responses {
                    let blob = response.to_bytes()?;
                    writer.write_varint(VarInt::from(blob.len()));
                    writer.write_bytes(&blob);
                }
            }
        }

        Ok(())
    }

    /// Rebuild the nested graph from ancestry binary v1. The tip is the
    /// last transaction on the wire; parents are rewired from each
    /// transaction's inputs.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SpvError> {
        let ancestors = parse_ancestry(data)?;
        let tip = ancestors.last().ok_or(SpvError::NilInitialPayment)?;

        let mut by_txid: BTreeMap<String, &Ancestor> = BTreeMap::new();
        for ancestor in &ancestors {
            by_txid.insert(ancestor.tx.tx_id_hex(), ancestor);
        }

        let mut on_path = HashSet::new();
        build_node(&tip.tx.tx_id_hex(), &by_txid, &mut on_path)
    }
}

fn build_node(
    txid: &str,
    by_txid: &BTreeMap<String, &Ancestor>,
    on_path: &mut HashSet<String>,
) -> Result<AncestryJson, SpvError> {
    let ancestor = by_txid
        .get(txid)
        .ok_or_else(|| SpvError::TxNotFound(txid.to_string()))?;

    let proof = match &ancestor.proof {
        Some(bytes) => Some(MerkleProof::from_bytes(bytes)?),
        None => None,
    };
    let mapi_responses = if ancestor.mapi_responses.is_empty() {
        None
    } else {
        let mut parsed = Vec::with_capacity(ancestor.mapi_responses.len());
        for blob in &ancestor.mapi_responses {
            parsed.push(MapiCallback::from_bytes(blob)?);
        }
        Some(parsed)
    };

    let mut node = AncestryJson {
        txid: txid.to_string(),
        raw_tx: ancestor.tx.to_hex(),
        proof,
        mapi_responses,
        parents: BTreeMap::new(),
    };

    // Anchored nodes end their branch; only unconfirmed ones get parents.
    if node.proof.is_none() {
        on_path.insert(txid.to_string());
        for input in &ancestor.tx.inputs {
            let parent_txid = input.source_txid_hex();
            if on_path.contains(&parent_txid) || !by_txid.contains_key(&parent_txid) {
                continue;
            }
            let parent = build_node(&parent_txid, by_txid, on_path)?;
            node.parents.insert(parent_txid, parent);
        }
        on_path.remove(txid);
    }

    Ok(node)
}

/// The flat TSC-standard ancestry list.
pub type TscAncestriesJson = Vec<TscAncestryJson>;

/// One ancestor in the flat TSC wire form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TscAncestryJson {
    /// The raw transaction hex.
    #[serde(rename = "rawtx", default, skip_serializing_if = "String::is_empty")]
    pub raw_tx: String,

    /// The merkle proof anchoring this transaction, when mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<MerkleProof>,

    /// Merchant-API callbacks attached to this transaction.
    #[serde(
        rename = "mapiResponses",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mapi_responses: Option<Vec<MapiCallback>>,
}

/// Decode ancestry binary v1 into the flat TSC list, wire order preserved.
pub fn tsc_ancestries_from_bytes(data: &[u8]) -> Result<TscAncestriesJson, SpvError> {
    let ancestors = parse_ancestry(data)?;
    let mut list = Vec::with_capacity(ancestors.len());
    for ancestor in ancestors {
        let proof = match &ancestor.proof {
            Some(bytes) => Some(MerkleProof::from_bytes(bytes)?),
            None => None,
        };
        let mapi_responses = if ancestor.mapi_responses.is_empty() {
            None
        } else {
            let mut parsed = Vec::with_capacity(ancestor.mapi_responses.len());
            for blob in &ancestor.mapi_responses {
                parsed.push(MapiCallback::from_bytes(blob)?);
            }
            Some(parsed)
        };
        list.push(TscAncestryJson {
            raw_tx: ancestor.tx.to_hex(),
            proof,
            mapi_responses,
        });
    }
    Ok(list)
}

/// Encode a flat TSC ancestry list to ancestry binary v1.
pub fn tsc_ancestries_to_bytes(ancestries: &TscAncestriesJson) -> Result<Vec<u8>, SpvError> {
    let mut writer = ByteWriter::new();
    writer.write_u8(ANCESTRY_VERSION);
    for ancestor in ancestries {
        let raw_tx = hex::decode(&ancestor.raw_tx)?;
        writer.write_u8(FLAG_TX);
        writer.write_varint(VarInt::from(raw_tx.len()));
        writer.write_bytes(&raw_tx);

        if let Some(proof) = &ancestor.proof {
            let proof_bytes = proof.to_bytes()?;
            writer.write_u8(FLAG_PROOF);
            writer.write_varint(VarInt::from(proof_bytes.len()));
            writer.write_bytes(&proof_bytes);
        }
        if let Some(mapi_responses) = &ancestor.mapi_responses {
            if !mapi_responses.is_empty() {
                writer.write_u8(FLAG_MAPI);
                writer.write_varint(VarInt::from(mapi_responses.len()));
                for response in mapi_responses {
                    let blob = response.to_bytes()?;
                    writer.write_varint(VarInt::from(blob.len()));
                    writer.write_bytes(&blob);
                }
            }
        }
    }
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bc_transaction::{TransactionInput, TransactionOutput};

    fn simple_tx(tag: u8, source: Option<&Transaction>) -> Transaction {
        let mut tx = Transaction::new();
        let mut input = TransactionInput::default();
        match source {
            Some(parent) => {
                input.source_txid = *parent.tx_id().as_bytes();
                input.source_tx_out_index = 0;
            }
            None => input.source_txid = [tag; 32],
        }
        tx.add_input(input);
        tx.add_output(TransactionOutput {
            satoshis: 1000 + tag as u64,
            locking_script: vec![0x51, tag],
        });
        tx
    }

    fn sample_graph() -> AncestryJson {
        let grandparent = simple_tx(1, None);
        let parent = simple_tx(2, Some(&grandparent));
        let tip = simple_tx(3, Some(&parent));

        let grandparent_node = AncestryJson {
            txid: grandparent.tx_id_hex(),
            raw_tx: grandparent.to_hex(),
            proof: Some(MerkleProof {
                index: 0,
                tx_or_id: grandparent.tx_id_hex(),
                target: grandparent.tx_id_hex(),
                nodes: vec![],
                target_type: Some("merkleRoot".to_string()),
                proof_type: None,
                composite: false,
            }),
            mapi_responses: Some(vec![MapiCallback {
                callback_payload: "{}".to_string(),
                api_version: "1.5.0".to_string(),
                timestamp: "2024-01-09T12:00:00Z".to_string(),
                miner_id: "03ad".to_string(),
                block_hash: "00".to_string(),
                block_height: 1,
                callback_tx_id: grandparent.tx_id_hex(),
                callback_reason: "merkleProof".to_string(),
            }]),
            parents: BTreeMap::new(),
        };

        let mut parent_node = AncestryJson {
            txid: parent.tx_id_hex(),
            raw_tx: parent.to_hex(),
            ..Default::default()
        };
        parent_node
            .parents
            .insert(grandparent.tx_id_hex(), grandparent_node);

        let mut tip_node = AncestryJson {
            txid: tip.tx_id_hex(),
            raw_tx: tip.to_hex(),
            ..Default::default()
        };
        tip_node.parents.insert(parent.tx_id_hex(), parent_node);
        tip_node
    }

    #[test]
    fn nested_graph_round_trips_through_binary() {
        let graph = sample_graph();
        let bytes = graph.to_bytes().unwrap();
        assert_eq!(bytes[0], ANCESTRY_VERSION);

        let rebuilt = AncestryJson::from_bytes(&bytes).unwrap();
        assert_eq!(rebuilt, graph);
    }

    #[test]
    fn shared_ancestors_are_written_once() {
        // Two parents both funded by the same grandparent.
        let grandparent = simple_tx(1, None);
        let parent_a = simple_tx(2, Some(&grandparent));
        let parent_b = simple_tx(3, Some(&grandparent));

        let mut tip = Transaction::new();
        for parent in [&parent_a, &parent_b] {
            let mut input = TransactionInput::default();
            input.source_txid = *parent.tx_id().as_bytes();
            tip.add_input(input);
        }
        tip.add_output(TransactionOutput {
            satoshis: 1,
            locking_script: vec![],
        });

        let grandparent_node = AncestryJson {
            txid: grandparent.tx_id_hex(),
            raw_tx: grandparent.to_hex(),
            ..Default::default()
        };
        let mut tip_node = AncestryJson {
            txid: tip.tx_id_hex(),
            raw_tx: tip.to_hex(),
            ..Default::default()
        };
        for parent in [&parent_a, &parent_b] {
            let mut node = AncestryJson {
                txid: parent.tx_id_hex(),
                raw_tx: parent.to_hex(),
                ..Default::default()
            };
            node.parents
                .insert(grandparent.tx_id_hex(), grandparent_node.clone());
            tip_node.parents.insert(parent.tx_id_hex(), node);
        }

        let bytes = tip_node.to_bytes().unwrap();
        let flat = tsc_ancestries_from_bytes(&bytes).unwrap();
        // grandparent, two parents, tip: four sections, no duplicate.
        assert_eq!(flat.len(), 4);
        assert_eq!(flat[0].raw_tx, grandparent.to_hex());
        assert_eq!(flat[3].raw_tx, tip.to_hex());
    }

    #[test]
    fn flat_list_round_trips() {
        let bytes = sample_graph().to_bytes().unwrap();
        let flat = tsc_ancestries_from_bytes(&bytes).unwrap();
        assert_eq!(flat.len(), 3);
        assert!(flat[0].proof.is_some());
        assert!(flat[0].mapi_responses.is_some());

        let encoded = tsc_ancestries_to_bytes(&flat).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn version_byte_is_enforced() {
        let mut bytes = sample_graph().to_bytes().unwrap();
        bytes[0] = 2;
        assert!(matches!(
            AncestryJson::from_bytes(&bytes),
            Err(SpvError::UnsupportedVersion)
        ));
    }

    #[test]
    fn unknown_section_tag_is_rejected() {
        let graph = sample_graph();
        let mut bytes = graph.to_bytes().unwrap();
        // The first section tag sits right after the version byte.
        bytes[1] = 0x09;
        assert!(matches!(
            AncestryJson::from_bytes(&bytes),
            Err(SpvError::InvalidAncestry(_))
        ));
    }

    #[test]
    fn nested_json_shape() {
        let graph = sample_graph();
        let json = serde_json::to_string(&graph).unwrap();
        assert!(json.contains("\"rawTx\""));
        assert!(json.contains("\"parents\""));
        let back: AncestryJson = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }
}
