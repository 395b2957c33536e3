#![deny(missing_docs)]

//! Simplified Payment Verification evidence for Bitcoin-family chains.
//!
//! Builds and checks the artifacts a recipient needs to confirm a payment
//! is buried in the chain without holding the chain itself: merkle trees
//! over a block's transaction ids, single-transaction (TSC) and block-wide
//! (BRC-74 BUMP) inclusion proofs, 80-byte block headers with compact-target
//! expansion and proof-of-work validation, and recursive ancestry envelopes
//! that thread unconfirmed transactions back to confirmed ancestors.
//!
//! Chain access is injected: implement [`BlockHeaderChain`] over whatever
//! header store is available and hand it to the verifiers.

/// Block header codec and proof-of-work validation.
pub mod block_header;
/// BRC-74 block-wide unified merkle paths.
pub mod bump;
/// Error types for SPV operations.
pub mod error;
/// Injected block-header lookup.
pub mod header_chain;
/// Merchant-API callback payloads.
pub mod mapi_callback;
/// BRC-58 single-transaction merkle paths.
pub mod merkle_path;
/// TSC merkle inclusion proofs and their verifier.
pub mod merkle_proof;
/// Merkle tree construction over block transaction ids.
pub mod merkle_tree;
/// Merkle tree parent hashing.
pub mod merkle_tree_parent;
/// Ancestry envelopes, their creator, and the payment verifier.
pub mod spv;
/// Compact-target ("nBits") expansion.
pub mod target;

pub use block_header::BlockHeader;
pub use bump::{Bump, BumpLeaf, LeafKind};
pub use error::SpvError;
pub use header_chain::BlockHeaderChain;
pub use mapi_callback::MapiCallback;
pub use merkle_path::MerklePath;
pub use merkle_proof::{MerkleProof, MerkleProofVerifier};
pub use spv::ancestry::{AncestryJson, TscAncestriesJson, TscAncestryJson};
pub use spv::create::{EnvelopeCreator, MerkleProofGetter, TxGetter};
pub use spv::verify::{Payment, PaymentVerifier, VerifyOptions};
