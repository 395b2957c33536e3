/// Error type for primitive encoding and hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    /// A hash value had the wrong length or malformed hex.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// A reader ran out of bytes mid-value.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
