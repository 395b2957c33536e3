//! 32-byte chain hash with the reversed-hex display convention.
//!
//! On-chain binary encodings carry hashes in natural order (as the hash
//! function emits them); every user-visible hex string is byte-reversed.
//! `Hash` keeps natural-order bytes internally and crosses that boundary
//! exactly once, in `Display`/`from_hex`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::hash::sha256d;
use crate::PrimitivesError;

/// Byte length of a [`Hash`].
pub const HASH_SIZE: usize = 32;

/// A transaction ID, block hash, or merkle node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Wrap raw natural-order bytes.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Copy a natural-order byte slice; the slice must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != HASH_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            )));
        }
        let mut arr = [0u8; HASH_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Hash(arr))
    }

    /// Parse a byte-reversed (display order) hex string.
    ///
    /// Strings shorter than 64 characters are treated as having their
    /// leading zeros stripped and are padded back on the high end; an odd
    /// nibble count is padded with a single leading zero first.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.is_empty() {
            return Ok(Hash::default());
        }
        if hex_str.len() > HASH_SIZE * 2 {
            return Err(PrimitivesError::InvalidHash(format!(
                "max hash string length is {} characters",
                HASH_SIZE * 2
            )));
        }

        let padded = if hex_str.len() % 2 != 0 {
            format!("0{hex_str}")
        } else {
            hex_str.to_string()
        };
        let decoded = hex::decode(padded)?;

        // Right-align in display order, then flip into natural order.
        let mut arr = [0u8; HASH_SIZE];
        for (i, b) in decoded.iter().rev().enumerate() {
            arr[i] = *b;
        }
        Ok(Hash(arr))
    }

    /// The natural-order bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl fmt::Display for Hash {
    /// Byte-reversed hex, the canonical display form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

impl FromStr for Hash {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Double-SHA-256 of `data` as a [`Hash`].
pub fn double_hash(data: &[u8]) -> Hash {
    Hash(sha256d(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Genesis block hash in natural (internal) byte order.
    const GENESIS_HASH: Hash = Hash([
        0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7,
        0x4f, 0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00,
        0x00, 0x00,
    ]);

    #[test]
    fn from_hex_genesis() {
        let h = Hash::from_hex("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f")
            .unwrap();
        assert_eq!(h, GENESIS_HASH);

        // Stripped leading zeros restore to the same hash.
        let short = Hash::from_hex("19d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f").unwrap();
        assert_eq!(short, GENESIS_HASH);
    }

    #[test]
    fn from_hex_edge_cases() {
        assert_eq!(Hash::from_hex("").unwrap(), Hash::default());

        let one = Hash::from_hex("1").unwrap();
        let mut expected = [0u8; HASH_SIZE];
        expected[0] = 0x01;
        assert_eq!(one, Hash::new(expected));

        // Too long.
        assert!(Hash::from_hex(
            "01234567890123456789012345678901234567890123456789012345678912345"
        )
        .is_err());
        // Not hex.
        assert!(Hash::from_hex("abcdefg").is_err());
    }

    #[test]
    fn display_reverses_bytes() {
        // Block 100000 hash, natural order.
        let h = Hash::new([
            0x06, 0xe5, 0x33, 0xfd, 0x1a, 0xda, 0x86, 0x39, 0x1f, 0x3f, 0x6c, 0x34, 0x32, 0x04,
            0xb0, 0xd2, 0x78, 0xd4, 0xaa, 0xec, 0x1c, 0x0b, 0x20, 0xaa, 0x27, 0xba, 0x03, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(
            h.to_string(),
            "000000000003ba27aa200b1cecaad478d2b00432346c3f1f3986da1afd33e506"
        );
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        assert!(Hash::from_bytes(&[0u8; 31]).is_err());
        assert!(Hash::from_bytes(&[0u8; 33]).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let h = double_hash(b"hello");
        let json = serde_json::to_string(&h).unwrap();
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
