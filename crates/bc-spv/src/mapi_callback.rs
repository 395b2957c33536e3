//! Merchant-API callback payloads.

use serde::{Deserialize, Serialize};

use crate::error::SpvError;

/// The JSON body a Merchant API server posts to a payment's callback URL.
///
/// The miner signs the callback bytes, so the whole object is handled as
/// a blob: parsing and re-serializing must reproduce the exact JSON or the
/// signature dies with it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapiCallback {
    /// The signed payload, itself a JSON document in string form.
    pub callback_payload: String,
    /// Merchant API version.
    pub api_version: String,
    /// Timestamp of the callback.
    pub timestamp: String,
    /// The signing miner's identity key.
    pub miner_id: String,
    /// Hash of the block containing the transaction.
    pub block_hash: String,
    /// Height of that block.
    pub block_height: u64,
    /// The transaction the callback concerns.
    pub callback_tx_id: String,
    /// Why the callback fired (e.g. `merkleProof`).
    pub callback_reason: String,
}

impl MapiCallback {
    /// Parse a callback from its signed JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpvError> {
        if bytes.is_empty() {
            return Err(SpvError::TriedToParseZeroBytes);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize back to the JSON blob form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpvError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_byte_for_byte() {
        let callback = MapiCallback {
            callback_payload: "{\"index\":3}".to_string(),
            api_version: "1.5.0".to_string(),
            timestamp: "2024-01-09T12:00:00.000Z".to_string(),
            miner_id: "03ad".to_string(),
            block_hash: "000000000000000002bf9cb2466d7b9af4a35d925500f3e0c6deacc4b840d4d4"
                .to_string(),
            block_height: 820000,
            callback_tx_id: "4a5e".to_string(),
            callback_reason: "merkleProof".to_string(),
        };
        let bytes = callback.to_bytes().unwrap();
        let parsed = MapiCallback::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, callback);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert!(matches!(
            MapiCallback::from_bytes(&[]),
            Err(SpvError::TriedToParseZeroBytes)
        ));
    }

    #[test]
    fn json_field_names_follow_the_mapi_spec() {
        let json = serde_json::to_string(&MapiCallback::default()).unwrap();
        for field in [
            "callbackPayload",
            "apiVersion",
            "timestamp",
            "minerId",
            "blockHash",
            "blockHeight",
            "callbackTxId",
            "callbackReason",
        ] {
            assert!(json.contains(field), "missing {field}");
        }
    }
}
