//! Bitcoin block header codec and proof-of-work validation.
//!
//! The 80-byte wire layout is `version(4 LE) ‖ prev(32) ‖ merkle(32) ‖
//! time(4 LE) ‖ bits(4) ‖ nonce(4 LE)`, with the three hash-like fields
//! byte-reversed relative to their display form. The struct holds them in
//! display order so the hex accessors and JSON form are direct reads.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use bc_primitives::hash::sha256d;
use bc_primitives::util::reverse_bytes;

use crate::error::SpvError;
use crate::target::expand_target_int;

/// Serialized length of a block header.
pub const BLOCK_HEADER_SIZE: usize = 80;

/// A Bitcoin block header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version number.
    pub version: u32,
    /// Block timestamp, seconds since the Unix epoch.
    pub time: u32,
    /// Proof-of-work nonce.
    pub nonce: u32,
    /// Previous block hash, display byte order.
    pub hash_prev_block: [u8; 32],
    /// Merkle root over the block's transactions, display byte order.
    pub hash_merkle_root: [u8; 32],
    /// Compact proof-of-work target, display byte order.
    pub bits: [u8; 4],
}

impl BlockHeader {
    /// Decode an 80-byte header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        if bytes.len() != BLOCK_HEADER_SIZE {
            return Err(SpvError::InvalidBlockHeaderLength);
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[0..4]);
        let mut hash_prev_block = [0u8; 32];
        hash_prev_block.copy_from_slice(&bytes[4..36]);
        hash_prev_block.reverse();
        let mut hash_merkle_root = [0u8; 32];
        hash_merkle_root.copy_from_slice(&bytes[36..68]);
        hash_merkle_root.reverse();
        let mut time = [0u8; 4];
        time.copy_from_slice(&bytes[68..72]);
        let mut bits = [0u8; 4];
        bits.copy_from_slice(&bytes[72..76]);
        bits.reverse();
        let mut nonce = [0u8; 4];
        nonce.copy_from_slice(&bytes[76..80]);

        Ok(BlockHeader {
            version: u32::from_le_bytes(version),
            time: u32::from_le_bytes(time),
            nonce: u32::from_le_bytes(nonce),
            hash_prev_block,
            hash_merkle_root,
            bits,
        })
    }

    /// Decode a 160-character header hex string.
    pub fn from_hex(header_hex: &str) -> Result<Self, SpvError> {
        if header_hex.len() != BLOCK_HEADER_SIZE * 2 {
            return Err(SpvError::InvalidBlockHeaderLength);
        }
        Self::from_bytes(&hex::decode(header_hex)?)
    }

    /// Encode to the 80-byte wire form.
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut out = [0u8; BLOCK_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&reverse_bytes(&self.hash_prev_block));
        out[36..68].copy_from_slice(&reverse_bytes(&self.hash_merkle_root));
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&reverse_bytes(&self.bits));
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Encode to the 160-character hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The block hash as its display hex string.
    pub fn hash_hex(&self) -> String {
        hex::encode(reverse_bytes(&sha256d(&self.to_bytes())))
    }

    /// Previous block hash as display hex.
    pub fn hash_prev_block_hex(&self) -> String {
        hex::encode(self.hash_prev_block)
    }

    /// Merkle root as display hex.
    pub fn hash_merkle_root_hex(&self) -> String {
        hex::encode(self.hash_merkle_root)
    }

    /// Compact bits as display hex.
    pub fn bits_hex(&self) -> String {
        hex::encode(self.bits)
    }

    /// Whether the header satisfies the proof of work claimed in `bits`:
    /// its Hash256 read as a big-endian integer (after display reversal)
    /// must be strictly below the expanded target. Malformed bits make the
    /// header invalid rather than an error.
    pub fn valid(&self) -> bool {
        let target = match expand_target_int(&self.bits_hex()) {
            Ok(t) => t,
            Err(_) => return false,
        };
        let digest = reverse_bytes(&sha256d(&self.to_bytes()));
        BigUint::from_bytes_be(&digest) < target
    }
}

/// The merkle root of an 80-byte header hex string.
pub fn extract_merkle_root(header_hex: &str) -> Result<String, SpvError> {
    Ok(BlockHeader::from_hex(header_hex)?.hash_merkle_root_hex())
}

// JSON mirror: the hash-like fields are hex strings in display order.
#[derive(Serialize, Deserialize)]
struct BlockHeaderJson {
    version: u32,
    time: u32,
    nonce: u32,
    #[serde(rename = "hashPrevBlock")]
    hash_prev_block: String,
    #[serde(rename = "merkleRoot")]
    merkle_root: String,
    bits: String,
}

impl Serialize for BlockHeader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BlockHeaderJson {
            version: self.version,
            time: self.time,
            nonce: self.nonce,
            hash_prev_block: self.hash_prev_block_hex(),
            merkle_root: self.hash_merkle_root_hex(),
            bits: self.bits_hex(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BlockHeader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let json = BlockHeaderJson::deserialize(deserializer)?;
        let decode32 = |field: &str, value: &str| -> Result<[u8; 32], D::Error> {
            let bytes = hex::decode(value).map_err(D::Error::custom)?;
            bytes
                .try_into()
                .map_err(|_| D::Error::custom(format!("{field} must be 32 bytes")))
        };
        let bits: [u8; 4] = hex::decode(&json.bits)
            .map_err(D::Error::custom)?
            .try_into()
            .map_err(|_| D::Error::custom("bits must be 4 bytes"))?;

        Ok(BlockHeader {
            version: json.version,
            time: json.time,
            nonce: json.nonce,
            hash_prev_block: decode32("hashPrevBlock", &json.hash_prev_block)?,
            hash_merkle_root: decode32("merkleRoot", &json.merkle_root)?,
            bits,
        })
    }
}
