//! Block storage trait.

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, BlockId, Height};

use crate::StoreError;

/// One committed block row: the header fields the store understands plus the
/// opaque body bytes. Immutable once written; exactly one row per height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub reference: BlockId,
    pub timestamp: u64,
    pub generator: Address,
    /// Running total over every block's score up to and including this one.
    pub cumulative_score: u128,
    pub bytes: Vec<u8>,
}

/// Trait for block storage operations (the height-keyed block log).
pub trait BlockStore {
    /// Retrieve the block committed at the given height.
    fn block_at(&self, height: Height) -> Result<Option<BlockRecord>, StoreError>;

    /// Resolve a block id to the height it was committed at.
    fn height_of(&self, id: &BlockId) -> Result<Option<Height>, StoreError>;

    /// The greatest committed height, or 0 for an empty chain.
    fn last_height(&self) -> Result<Height, StoreError>;

    /// Total number of committed blocks.
    fn block_count(&self) -> Result<u64, StoreError>;
}
