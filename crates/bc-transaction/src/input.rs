//! Transaction input referencing a previous output.

use bc_primitives::util::{hex_from_bytes_reverse, ByteReader, ByteWriter, VarInt};

use crate::TransactionError;

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input spending an output of a previous transaction.
///
/// The unlocking script is carried as opaque bytes; this crate never
/// interprets scripts.
///
/// # Wire format
///
/// | Field               | Size          |
/// |---------------------|---------------|
/// | source_txid         | 32 bytes (LE) |
/// | source_tx_out_index | 4 bytes (LE)  |
/// | script length       | VarInt        |
/// | unlocking_script    | variable      |
/// | sequence_number     | 4 bytes (LE)  |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionInput {
    /// Txid of the transaction whose output is spent, natural byte order.
    pub source_txid: [u8; 32],

    /// Index of the spent output within the source transaction.
    pub source_tx_out_index: u32,

    /// Sequence number; `0xFFFFFFFF` means finalized.
    pub sequence_number: u32,

    /// The unlocking script (scriptSig) bytes, uninterpreted.
    pub unlocking_script: Vec<u8>,
}

impl TransactionInput {
    /// Deserialize one input from the reader.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::SerializationError(format!("reading source txid: {e}"))
        })?;
        let mut source_txid = [0u8; 32];
        source_txid.copy_from_slice(txid_bytes);

        let source_tx_out_index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {e}"))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {e}"))
        })?;
        let unlocking_script = reader
            .read_bytes(script_len.value() as usize)
            .map_err(|e| {
                TransactionError::SerializationError(format!("reading unlocking script: {e}"))
            })?
            .to_vec();

        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {e}"))
        })?;

        Ok(TransactionInput {
            source_txid,
            source_tx_out_index,
            sequence_number,
            unlocking_script,
        })
    }

    /// Serialize this input onto the writer.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.source_txid);
        writer.write_u32_le(self.source_tx_out_index);
        writer.write_varint(VarInt::from(self.unlocking_script.len()));
        writer.write_bytes(&self.unlocking_script);
        writer.write_u32_le(self.sequence_number);
    }

    /// The spent transaction's id as a display-order hex string.
    pub fn source_txid_hex(&self) -> String {
        hex_from_bytes_reverse(&self.source_txid)
    }
}

impl Default for TransactionInput {
    fn default() -> Self {
        TransactionInput {
            source_txid: [0u8; 32],
            source_tx_out_index: 0,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: Vec::new(),
        }
    }
}
