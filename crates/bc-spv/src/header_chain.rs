//! Injected block-header lookup.

use crate::block_header::BlockHeader;
use crate::error::SpvError;

/// Access to a chain of block headers, keyed by block hash.
///
/// Implementors back this with whatever header store is at hand: a header
/// service client, a pruned node, or a fixture map in tests. The verifiers
/// only ever request single headers and never mutate anything.
pub trait BlockHeaderChain {
    /// Fetch the header whose block hash is `block_hash_hex` (the
    /// reversed-hex display form).
    fn block_header(&self, block_hash_hex: &str) -> Result<BlockHeader, SpvError>;
}

impl<C: BlockHeaderChain + ?Sized> BlockHeaderChain for &C {
    fn block_header(&self, block_hash_hex: &str) -> Result<BlockHeader, SpvError> {
        (**self).block_header(block_hash_hex)
    }
}
