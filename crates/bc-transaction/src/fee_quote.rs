//! Miner fee quotes.

/// A miner's mining fee rate, expressed as satoshis per byte bundle.
///
/// Only the per-byte rate matters to SPV fee validation; policy fee types
/// beyond the standard mining rate are out of scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    /// Satoshis charged per `bytes` of transaction.
    pub satoshis: u64,
    /// The byte bundle the satoshi amount applies to.
    pub bytes: u64,
}

impl FeeQuote {
    /// A quote of `satoshis` per `bytes`.
    pub fn new(satoshis: u64, bytes: u64) -> Self {
        FeeQuote { satoshis, bytes }
    }

    /// The fee required for a transaction of `size` bytes.
    pub fn fee_for_size(&self, size: usize) -> u64 {
        (size as u64).saturating_mul(self.satoshis) / self.bytes.max(1)
    }
}

impl Default for FeeQuote {
    /// The customary standard mining rate of 500 satoshis per 1000 bytes.
    fn default() -> Self {
        FeeQuote {
            satoshis: 500,
            bytes: 1000,
        }
    }
}
