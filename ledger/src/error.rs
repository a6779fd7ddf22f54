use thiserror::Error;

use tidemark_store::StoreError;
use tidemark_types::BlockId;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("unknown block id: {0}")]
    UnknownBlock(BlockId),

    #[error("block body codec error: {0}")]
    Codec(String),

    #[error("configuration error: {0}")]
    Config(String),
}
