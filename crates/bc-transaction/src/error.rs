/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The transaction structure is invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// Binary or hex serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// An underlying primitives error.
    #[error("primitives error: {0}")]
    Primitives(#[from] bc_primitives::PrimitivesError),
}
