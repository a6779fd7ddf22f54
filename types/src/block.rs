//! Block header and opaque block payload.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::ids::BlockId;

/// The small, structured part of a block that the ledger store understands.
///
/// Everything else about a block (its transaction payload, its signature, its
/// consensus fields) travels through the store as an opaque byte blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub id: BlockId,
    /// Id of the parent block this one extends.
    pub reference: BlockId,
    pub timestamp: u64,
    /// Address of the account that generated (forged) this block.
    pub generator: Address,
    /// This block's own score contribution. The store persists the running
    /// cumulative score, not this per-block value.
    pub score: u128,
}

/// A block as handed to the append path: a header plus the raw serialized
/// body. The body's wire format is owned by the block codec upstream; the
/// store only ever round-trips the bytes, and the transaction indexer decodes
/// them lazily, off the append path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub bytes: Vec<u8>,
}

impl Block {
    pub fn new(header: BlockHeader, bytes: Vec<u8>) -> Self {
        Self { header, bytes }
    }

    pub fn id(&self) -> BlockId {
        self.header.id
    }
}
