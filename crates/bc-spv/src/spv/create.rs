//! Building ancestry envelopes from injected lookups.

use std::collections::{HashMap, HashSet, VecDeque};

use bc_transaction::Transaction;

use crate::error::SpvError;
use crate::merkle_proof::MerkleProof;

use super::ancestry::AncestryJson;

/// Transaction lookup used while walking a payment's ancestry.
///
/// `Ok(None)` means the store does not know the transaction, which aborts
/// envelope creation; a broken ancestry is worse than none.
pub trait TxGetter {
    /// Fetch a transaction by its reversed-hex txid.
    fn tx(&self, txid: &str) -> Result<Option<Transaction>, SpvError>;
}

/// Merkle proof lookup. `Ok(None)` simply means the transaction is not
/// mined yet, so the walk continues into its inputs.
pub trait MerkleProofGetter {
    /// Fetch the inclusion proof for a reversed-hex txid, if one exists.
    fn merkle_proof(&self, txid: &str) -> Result<Option<MerkleProof>, SpvError>;
}

/// Builds ancestry envelopes by walking a tip transaction's inputs
/// breadth-first until every branch reaches an anchored ancestor.
pub struct EnvelopeCreator<T, M> {
    txs: T,
    proofs: M,
}

// Per-txid results of the fetch phase, before nesting.
struct FetchedAncestor {
    raw_tx: String,
    proof: Option<MerkleProof>,
    parents: Vec<String>,
}

impl<T: TxGetter, M: MerkleProofGetter> EnvelopeCreator<T, M> {
    /// A creator using `txs` and `proofs` as its lookups.
    pub fn new(txs: T, proofs: M) -> Self {
        EnvelopeCreator { txs, proofs }
    }

    /// Build the ancestry for `tip`.
    ///
    /// Every unique ancestor txid is fetched once. An ancestor with a
    /// proof anchors its branch and its own inputs are not walked; an
    /// unconfirmed ancestor recurses into the transactions funding it.
    pub fn create_tx_ancestry(&self, tip: &Transaction) -> Result<AncestryJson, SpvError> {
        if tip.inputs.is_empty() {
            return Err(SpvError::NoTxInputs);
        }

        let mut fetched: HashMap<String, FetchedAncestor> = HashMap::new();
        let mut queue: VecDeque<String> =
            tip.inputs.iter().map(|input| input.source_txid_hex()).collect();

        while let Some(txid) = queue.pop_front() {
            if fetched.contains_key(&txid) {
                continue;
            }

            let tx = self
                .txs
                .tx(&txid)
                .map_err(|e| SpvError::TxLookup {
                    txid: txid.clone(),
                    message: e.to_string(),
                })?
                .ok_or_else(|| SpvError::TxNotFound(txid.clone()))?;

            let proof = self
                .proofs
                .merkle_proof(&txid)
                .map_err(|e| SpvError::MerkleProofLookup {
                    txid: txid.clone(),
                    message: e.to_string(),
                })?;

            let parents = if proof.is_some() {
                Vec::new()
            } else {
                let parents: Vec<String> = tx
                    .inputs
                    .iter()
                    .map(|input| input.source_txid_hex())
                    .collect();
                for parent in &parents {
                    if !fetched.contains_key(parent) {
                        queue.push_back(parent.clone());
                    }
                }
                parents
            };

            fetched.insert(
                txid,
                FetchedAncestor {
                    raw_tx: tx.to_hex(),
                    proof,
                    parents,
                },
            );
        }

        let mut root = AncestryJson {
            txid: tip.tx_id_hex(),
            raw_tx: tip.to_hex(),
            ..Default::default()
        };
        let mut memo: HashMap<String, AncestryJson> = HashMap::new();
        let mut on_path = HashSet::new();
        for input in &tip.inputs {
            let parent_txid = input.source_txid_hex();
            if root.parents.contains_key(&parent_txid) {
                continue;
            }
            let node = assemble(&parent_txid, &fetched, &mut memo, &mut on_path)?;
            root.parents.insert(parent_txid, node);
        }
        Ok(root)
    }
}

// Turn the flat fetch results into the nested graph, memoizing shared
// ancestors so the DAG stays deduplicated by txid.
fn assemble(
    txid: &str,
    fetched: &HashMap<String, FetchedAncestor>,
    memo: &mut HashMap<String, AncestryJson>,
    on_path: &mut HashSet<String>,
) -> Result<AncestryJson, SpvError> {
    if let Some(done) = memo.get(txid) {
        return Ok(done.clone());
    }
    // A well-formed chain cannot spend its own descendants.
    if !on_path.insert(txid.to_string()) {
        return Err(SpvError::InvalidTransaction(format!(
            "circular ancestry at tx {txid}"
        )));
    }

    let ancestor = fetched
        .get(txid)
        .ok_or_else(|| SpvError::TxNotFound(txid.to_string()))?;

    let mut node = AncestryJson {
        txid: txid.to_string(),
        raw_tx: ancestor.raw_tx.clone(),
        proof: ancestor.proof.clone(),
        ..Default::default()
    };
    for parent_txid in &ancestor.parents {
        if node.parents.contains_key(parent_txid) {
            continue;
        }
        let parent = assemble(parent_txid, fetched, memo, on_path)?;
        node.parents.insert(parent_txid.clone(), parent);
    }

    on_path.remove(txid);
    memo.insert(txid.to_string(), node.clone());
    Ok(node)
}
