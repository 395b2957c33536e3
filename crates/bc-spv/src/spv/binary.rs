//! Ancestry binary v1 parsing.
//!
//! The wire form is a version byte (`0x01`) followed by a sequence of
//! tagged, length-prefixed sections. Each `0x01` (raw tx) section starts a
//! new ancestor; `0x02` (proof) and `0x03` (mapi responses) attach to the
//! ancestor most recently started.

use bc_primitives::util::ByteReader;
use bc_transaction::Transaction;

use crate::error::SpvError;

/// Section tag: a raw transaction.
pub(crate) const FLAG_TX: u8 = 0x01;
/// Section tag: a TSC merkle proof.
pub(crate) const FLAG_PROOF: u8 = 0x02;
/// Section tag: a list of mapi callback blobs.
pub(crate) const FLAG_MAPI: u8 = 0x03;

/// The supported ancestry binary version.
pub(crate) const ANCESTRY_VERSION: u8 = 0x01;

/// A decoded ancestor: its transaction, the raw proof bytes when anchored,
/// and any attached mapi callback blobs.
pub(crate) struct Ancestor {
    pub tx: Transaction,
    pub proof: Option<Vec<u8>>,
    pub mapi_responses: Vec<Vec<u8>>,
}

/// Decode an ancestry binary blob into its ancestors, in wire order.
pub(crate) fn parse_ancestry(data: &[u8]) -> Result<Vec<Ancestor>, SpvError> {
    let mut reader = ByteReader::new(data);
    if reader.read_u8()? != ANCESTRY_VERSION {
        return Err(SpvError::UnsupportedVersion);
    }

    let mut ancestors: Vec<Ancestor> = Vec::new();
    while reader.remaining() > 0 {
        match reader.read_u8()? {
            FLAG_TX => {
                let len = reader.read_varint()?.value() as usize;
                let tx = Transaction::from_bytes(reader.read_bytes(len)?)?;
                ancestors.push(Ancestor {
                    tx,
                    proof: None,
                    mapi_responses: Vec::new(),
                });
            }
            FLAG_PROOF => {
                let len = reader.read_varint()?.value() as usize;
                let proof = reader.read_bytes(len)?.to_vec();
                ancestors
                    .last_mut()
                    .ok_or_else(|| {
                        SpvError::InvalidAncestry("proof section before any transaction".to_string())
                    })?
                    .proof = Some(proof);
            }
            FLAG_MAPI => {
                let count = reader.read_varint()?.value();
                let ancestor = ancestors.last_mut().ok_or_else(|| {
                    SpvError::InvalidAncestry("mapi section before any transaction".to_string())
                })?;
                for _ in 0..count {
                    let len = reader.read_varint()?.value() as usize;
                    if len == 0 {
                        return Err(SpvError::TriedToParseZeroBytes);
                    }
                    ancestor.mapi_responses.push(reader.read_bytes(len)?.to_vec());
                }
            }
            other => {
                return Err(SpvError::InvalidAncestry(format!(
                    "unknown section tag {other:#04x}"
                )))
            }
        }
    }

    Ok(ancestors)
}
