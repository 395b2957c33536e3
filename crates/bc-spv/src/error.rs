/// Errors returned by the SPV evidence types, the envelope creator, and
/// the payment verifier.
#[derive(Debug, thiserror::Error)]
pub enum SpvError {
    // -- block header ------------------------------------------------------
    /// A block header was not exactly 80 bytes (160 hex characters).
    #[error("block header should be 80 bytes long")]
    InvalidBlockHeaderLength,

    // -- merkle tree -------------------------------------------------------
    /// A merkle tree was requested over an empty transaction list.
    #[error("merkle tree is empty")]
    EmptyMerkleTree,
    /// The requested leaf index does not exist in the tree.
    #[error("index out of range for proof")]
    IndexOutOfRange,
    /// A raw transaction could not be parsed, or the ancestry graph is
    /// malformed.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    // -- BUMP --------------------------------------------------------------
    /// BUMP bytes are too short to hold any path.
    #[error("BUMP bytes do not contain enough data to be valid")]
    InsufficientBumpData,
    /// A BUMP level holds no leaves.
    #[error("there are no leaves at height which makes this invalid")]
    InvalidLeafHeight,
    /// The BUMP does not cover the requested txid at level 0.
    #[error("the BUMP does not contain the txid: {0}")]
    TxidNotInBump(String),
    /// A sibling required to reach the root is neither listed nor derivable.
    #[error("we do not have a hash for this index at height: {0}")]
    NoHashAtIndex(usize),

    // -- compact target ----------------------------------------------------
    /// The target or compact-bits field is malformed.
    #[error("invalid target field")]
    InvalidTarget,
    /// The target type is unknown or disagrees with the target value.
    #[error("invalid TargetType or target field")]
    InvalidTargetType,

    // -- merkle proof ------------------------------------------------------
    /// The replayed merkle branch does not land on the expected root.
    #[error("invalid merkle proof, payment invalid")]
    InvalidProof,
    /// The proof flag byte carries an unsupported combination.
    #[error("invalid flags used in merkle proof")]
    InvalidMerkleFlags,
    /// The proof carries no transaction id.
    #[error("missing txid in proof")]
    MissingTxidInProof,
    /// The proof carries no target root.
    #[error("missing root in proof")]
    MissingRootInProof,
    /// A duplicate marker appears on the left-hand side of the node list.
    #[error("invalid nodes")]
    InvalidNodes,
    /// Only merkle-branch proofs are supported.
    #[error("only merkle branch supported in this version")]
    OnlyMerkleBranchSupported,
    /// Composite proofs are not supported.
    #[error("only single proof supported in this version")]
    OnlySingleProofSupported,
    /// A txid was expected but a full transaction was supplied.
    #[error("expecting txid but got tx")]
    ExpectingTxidButGotTx,
    /// A full transaction was expected but a txid was supplied.
    #[error("expecting tx but got txid")]
    ExpectingTxButGotTxid,
    /// The txOrId field is shorter than a txid.
    #[error("invalid txOrId length - must be at least 64 chars (32 bytes)")]
    InvalidTxOrIdLength,
    /// A full transaction payload no longer than a bare txid.
    #[error("invalid tx length (should be greater than 32 bytes)")]
    InvalidTxLength,
    /// A proof node begins with an unknown type byte.
    #[error("invalid value in node type")]
    InvalidNodeType,

    // -- ancestry ----------------------------------------------------------
    /// The tip transaction has no inputs to build an ancestry from.
    #[error("provided tx has no inputs to build ancestry from")]
    NoTxInputs,
    /// A transaction lookup returned nothing.
    #[error("could not find tx {0}: tx not found")]
    TxNotFound(String),
    /// A transaction lookup failed.
    #[error("failed to get tx {txid}: {message}")]
    TxLookup {
        /// The txid being fetched.
        txid: String,
        /// The underlying lookup failure.
        message: String,
    },
    /// A merkle proof lookup failed.
    #[error("failed to get merkle proof for tx {txid}: {message}")]
    MerkleProofLookup {
        /// The txid whose proof was being fetched.
        txid: String,
        /// The underlying lookup failure.
        message: String,
    },
    /// The ancestry binary is not version 1.
    #[error("we only support version 1 of the Ancestor Binary format")]
    UnsupportedVersion,
    /// A mapi response section held zero bytes.
    #[error("there are no mapi response bytes to parse")]
    TriedToParseZeroBytes,
    /// The ancestry binary is structurally malformed.
    #[error("invalid ancestry: {0}")]
    InvalidAncestry(String),

    // -- payment verification ----------------------------------------------
    /// An unconfirmed ancestor's input is not present in its parents.
    #[error("a tx input missing in parent ancestor")]
    NotAllInputsSupplied,
    /// An ancestor has no inputs to verify.
    #[error("a tx has no inputs to verify")]
    NoTxInputsToVerify,
    /// No payment or ancestry was supplied.
    #[error("initial payment cannot be nil")]
    NilInitialPayment,
    /// An input's output index exceeds the parent's output count.
    #[error("tx input index into output is out of bounds")]
    InputRefsOutOfBoundsOutput,
    /// Fee validation was requested without a fee quote.
    #[error("no fee quote supplied for fee validation, supply one using verify_fees")]
    NoFeeQuoteSupplied,
    /// The payment does not cover the quoted fee for its size.
    #[error("not enough fees paid")]
    FeePaidNotEnough,
    /// The tip's parents are absent so the fee paid cannot be computed.
    #[error("no parents supplied in ancestry which means we cannot validate fees, either ensure parents are supplied or remove fee check")]
    CannotCalculateFeePaid,
    /// An output referenced by the payment tx is missing from its parent.
    #[error("expected output used in payment tx missing")]
    MissingOutput,
    /// The ancestry breaks: an ancestor has neither a proof nor its parent.
    #[error("break in the ancestry missing either a parent transaction or a proof")]
    ProofOrInputMissing,
    /// No path from the tip reaches a confirmed ancestor.
    #[error("not confirmed/anchored tx(s) provided")]
    NoConfirmedTransaction,
    /// The tip transaction itself is already confirmed.
    #[error("tip transaction must be unconfirmed")]
    TipTxConfirmed,
    /// A proof's txid does not match the transaction it is attached to.
    #[error("input and proof ID mismatch")]
    TxIdMismatch,

    // -- wrapped lower layers ----------------------------------------------
    /// Error propagated from the transaction layer.
    #[error("transaction error: {0}")]
    Transaction(#[from] bc_transaction::TransactionError),
    /// Error propagated from the primitives layer.
    #[error("primitives error: {0}")]
    Primitives(#[from] bc_primitives::PrimitivesError),
    /// Hex decoding error.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),
    /// JSON encoding or decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
