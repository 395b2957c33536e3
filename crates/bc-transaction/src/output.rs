//! Transaction output with satoshi value and locking script.

use bc_primitives::util::{ByteReader, ByteWriter, VarInt};

use crate::TransactionError;

/// A single output locking some satoshis behind a script.
///
/// # Wire format
///
/// | Field          | Size         |
/// |----------------|--------------|
/// | satoshis       | 8 bytes (LE) |
/// | script length  | VarInt       |
/// | locking_script | variable     |
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionOutput {
    /// The satoshi value locked by this output.
    pub satoshis: u64,

    /// The locking script (scriptPubKey) bytes, uninterpreted.
    pub locking_script: Vec<u8>,
}

impl TransactionOutput {
    /// Deserialize one output from the reader.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let satoshis = reader
            .read_u64_le()
            .map_err(|e| TransactionError::SerializationError(format!("reading satoshis: {e}")))?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {e}"))
        })?;
        let locking_script = reader
            .read_bytes(script_len.value() as usize)
            .map_err(|e| {
                TransactionError::SerializationError(format!("reading locking script: {e}"))
            })?
            .to_vec();

        Ok(TransactionOutput {
            satoshis,
            locking_script,
        })
    }

    /// Serialize this output onto the writer.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.satoshis);
        writer.write_varint(VarInt::from(self.locking_script.len()));
        writer.write_bytes(&self.locking_script);
    }
}
