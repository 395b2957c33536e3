//! Payment verification against ancestry evidence.
//!
//! The verifier decodes a payment's ancestry binary, optionally validates
//! fees, and then walks the ancestor set: every ancestor must either carry
//! a verifying merkle proof or have all of its inputs satisfied inside the
//! envelope, and at least one path from the tip must reach an anchored
//! ancestor.

use std::collections::{BTreeMap, HashSet, VecDeque};

use bc_transaction::{FeeQuote, Transaction};

use crate::error::SpvError;
use crate::header_chain::BlockHeaderChain;
use crate::merkle_proof::{MerkleProof, MerkleProofVerifier};

use super::ancestry::AncestryJson;
use super::binary::{parse_ancestry, Ancestor};

/// A tip payment transaction plus the serialized ancestry proving it.
pub struct Payment {
    /// The unconfirmed transaction being paid with.
    pub payment_tx: Transaction,
    /// Ancestry binary v1 covering the tip's ancestors.
    pub ancestry: Vec<u8>,
}

/// Which checks a verification run performs.
///
/// Defaults to full SPV (proof validation plus input closure) with no fee
/// check.
#[derive(Clone, Debug)]
pub struct VerifyOptions {
    spv: bool,
    proofs: bool,
    fees: bool,
    fee_quote: Option<FeeQuote>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            spv: true,
            proofs: true,
            fees: false,
            fee_quote: None,
        }
    }
}

impl VerifyOptions {
    /// The default option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip both proof validation and the input-closure walk.
    pub fn no_verify_spv(mut self) -> Self {
        self.spv = false;
        self.proofs = false;
        self
    }

    /// Keep the input-closure requirement but skip proof validation, and
    /// tolerate branches that end unconfirmed.
    pub fn no_verify_proofs(mut self) -> Self {
        self.proofs = false;
        self
    }

    /// Require the payment to cover `quote` for its byte size.
    pub fn verify_fees(mut self, quote: FeeQuote) -> Self {
        self.fees = true;
        self.fee_quote = Some(quote);
        self
    }
}

/// Verifies payments and their ancestry envelopes against an injected
/// block-header chain.
pub struct PaymentVerifier<C> {
    chain: C,
    options: VerifyOptions,
}

impl<C: BlockHeaderChain> PaymentVerifier<C> {
    /// A verifier with the default options.
    pub fn new(chain: C) -> Self {
        PaymentVerifier {
            chain,
            options: VerifyOptions::default(),
        }
    }

    /// A verifier whose default options are `options`.
    pub fn with_options(chain: C, options: VerifyOptions) -> Self {
        PaymentVerifier { chain, options }
    }

    /// Verify `payment` with the verifier's stored options.
    pub fn verify_payment(&self, payment: &Payment) -> Result<(), SpvError> {
        self.verify_payment_with(payment, &self.options)
    }

    /// Verify `payment` with per-call options overriding the stored ones.
    pub fn verify_payment_with(
        &self,
        payment: &Payment,
        options: &VerifyOptions,
    ) -> Result<(), SpvError> {
        if payment.ancestry.is_empty() {
            return Err(SpvError::NilInitialPayment);
        }

        let ancestors = parse_ancestry(&payment.ancestry)?;
        let mut by_txid: BTreeMap<String, Ancestor> = BTreeMap::new();
        for ancestor in ancestors {
            by_txid.insert(ancestor.tx.tx_id_hex(), ancestor);
        }

        if options.fees {
            self.verify_fees(&payment.payment_tx, &by_txid, options)?;
        }
        if options.spv {
            self.verify_ancestors(&payment.payment_tx, &by_txid, options)?;
        }
        Ok(())
    }

    // Fee check: every tip input's satoshis come from a parent in the
    // envelope; the surplus over the outputs must cover the quoted rate.
    fn verify_fees(
        &self,
        tip: &Transaction,
        ancestors: &BTreeMap<String, Ancestor>,
        options: &VerifyOptions,
    ) -> Result<(), SpvError> {
        let quote = options.fee_quote.as_ref().ok_or(SpvError::NoFeeQuoteSupplied)?;

        let mut paid_in: u64 = 0;
        for input in &tip.inputs {
            let parent = ancestors
                .get(&input.source_txid_hex())
                .ok_or(SpvError::CannotCalculateFeePaid)?;
            let output = parent
                .tx
                .outputs
                .get(input.source_tx_out_index as usize)
                .ok_or(SpvError::MissingOutput)?;
            paid_in += output.satoshis;
        }

        let fee_paid = paid_in.saturating_sub(tip.total_output_satoshis());
        if fee_paid < quote.fee_for_size(tip.size()) {
            return Err(SpvError::FeePaidNotEnough);
        }
        Ok(())
    }

    fn verify_ancestors(
        &self,
        tip: &Transaction,
        ancestors: &BTreeMap<String, Ancestor>,
        options: &VerifyOptions,
    ) -> Result<(), SpvError> {
        if tip.inputs.is_empty() {
            return Err(SpvError::NoTxInputsToVerify);
        }

        let tip_txid = tip.tx_id_hex();
        if let Some(tip_ancestor) = ancestors.get(&tip_txid) {
            if tip_ancestor.proof.is_some() {
                return Err(SpvError::TipTxConfirmed);
            }
        }

        let proof_verifier = MerkleProofVerifier::new(&self.chain);
        let mut anchored = HashSet::new();

        for (txid, ancestor) in ancestors {
            if ancestor.tx.inputs.is_empty() {
                return Err(SpvError::NoTxInputsToVerify);
            }

            match &ancestor.proof {
                Some(proof_bytes) => {
                    if options.proofs {
                        let proof = MerkleProof::from_bytes(proof_bytes)?;
                        if proof.derive_txid()? != *txid {
                            return Err(SpvError::TxIdMismatch);
                        }
                        if !proof_verifier.verify_merkle_proof(&proof)? {
                            return Err(SpvError::InvalidProof);
                        }
                    }
                    anchored.insert(txid.clone());
                }
                None => {
                    for input in &ancestor.tx.inputs {
                        match ancestors.get(&input.source_txid_hex()) {
                            Some(parent) => {
                                if input.source_tx_out_index as usize >= parent.tx.outputs.len() {
                                    return Err(SpvError::InputRefsOutOfBoundsOutput);
                                }
                            }
                            // With proofs disabled a branch may end
                            // unconfirmed; otherwise the chain is broken.
                            None if options.proofs => return Err(SpvError::ProofOrInputMissing),
                            None => {}
                        }
                    }
                }
            }
        }

        // The tip's own inputs must land in the envelope even when the tip
        // section itself was omitted from the binary.
        if options.proofs {
            for input in &tip.inputs {
                if !ancestors.contains_key(&input.source_txid_hex()) {
                    return Err(SpvError::ProofOrInputMissing);
                }
            }
        }

        if options.proofs && !reaches_anchor(&tip_txid, tip, ancestors, &anchored) {
            return Err(SpvError::NoConfirmedTransaction);
        }
        Ok(())
    }

    /// Verify a nested ancestry graph directly (the JSON form) with the
    /// verifier's stored options.
    pub fn verify_ancestry(&self, ancestry: &AncestryJson) -> Result<(), SpvError> {
        self.verify_ancestry_with(ancestry, &self.options)
    }

    /// Verify a nested ancestry graph with per-call options.
    ///
    /// The graph's root is the tip payment: it must be unconfirmed, and
    /// every branch below it must either end in a valid proof or, with
    /// proofs disabled, at least keep its inputs closed over the supplied
    /// parents.
    pub fn verify_ancestry_with(
        &self,
        ancestry: &AncestryJson,
        options: &VerifyOptions,
    ) -> Result<(), SpvError> {
        if ancestry.raw_tx.is_empty() {
            return Err(SpvError::NilInitialPayment);
        }
        if ancestry.proof.is_some() {
            return Err(SpvError::TipTxConfirmed);
        }
        if !options.spv {
            return Ok(());
        }

        let mut found_anchor = false;
        self.verify_node(ancestry, true, options, &mut found_anchor)?;
        if options.proofs && !found_anchor {
            return Err(SpvError::NoConfirmedTransaction);
        }
        Ok(())
    }

    fn verify_node(
        &self,
        node: &AncestryJson,
        is_tip: bool,
        options: &VerifyOptions,
        found_anchor: &mut bool,
    ) -> Result<(), SpvError> {
        let tx = Transaction::from_hex(&node.raw_tx)?;
        if tx.inputs.is_empty() {
            return Err(SpvError::NoTxInputsToVerify);
        }

        if !is_tip {
            if let Some(proof) = &node.proof {
                if options.proofs {
                    if proof.derive_txid()? != tx.tx_id_hex() {
                        return Err(SpvError::TxIdMismatch);
                    }
                    let verifier = MerkleProofVerifier::new(&self.chain);
                    if !verifier.verify_merkle_proof(proof)? {
                        return Err(SpvError::InvalidProof);
                    }
                }
                *found_anchor = true;
                return Ok(());
            }
        }

        if node.parents.is_empty() {
            // An unconfirmed branch end: broken unless proofs are waived.
            return if options.proofs {
                Err(SpvError::NoConfirmedTransaction)
            } else {
                Ok(())
            };
        }

        for input in &tx.inputs {
            let parent = node
                .parents
                .get(&input.source_txid_hex())
                .ok_or(SpvError::NotAllInputsSupplied)?;
            let parent_tx = Transaction::from_hex(&parent.raw_tx)?;
            if input.source_tx_out_index as usize >= parent_tx.outputs.len() {
                return Err(SpvError::InputRefsOutOfBoundsOutput);
            }
            self.verify_node(parent, false, options, found_anchor)?;
        }
        Ok(())
    }
}

// Breadth-first from the tip through parent links, looking for any
// anchored ancestor.
fn reaches_anchor(
    tip_txid: &str,
    tip: &Transaction,
    ancestors: &BTreeMap<String, Ancestor>,
    anchored: &HashSet<String>,
) -> bool {
    let mut queue: VecDeque<String> =
        tip.inputs.iter().map(|input| input.source_txid_hex()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(tip_txid.to_string());

    while let Some(txid) = queue.pop_front() {
        if !seen.insert(txid.clone()) {
            continue;
        }
        if anchored.contains(&txid) {
            return true;
        }
        if let Some(ancestor) = ancestors.get(&txid) {
            for input in &ancestor.tx.inputs {
                queue.push_back(input.source_txid_hex());
            }
        }
    }
    false
}
