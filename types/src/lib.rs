//! Fundamental types for the tidemark ledger store.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: addresses, entity identifiers, aliases, block headers, the
//! per-block state diff, and the transaction representation consumed by the
//! secondary indexer.

pub mod address;
pub mod alias;
pub mod block;
pub mod diff;
pub mod error;
pub mod ids;
pub mod transaction;

pub use address::Address;
pub use alias::Alias;
pub use block::{Block, BlockHeader};
pub use diff::{
    AliasCreate, AssetBalanceSnapshot, AssetIssue, AssetQuantityDelta, BalanceSnapshot, BlockDiff,
    LeaseCreate, LeaseDelta, OrderFillDelta,
};
pub use error::TypeError;
pub use ids::{AssetId, BlockId, LeaseId, OrderId, Signature, TxId};
pub use transaction::{ExchangeData, Transaction, TransferData, TxData, TxType};

/// Monotonically increasing block version axis. The first appended block has
/// height 1; height 0 means "empty chain".
pub type Height = u64;
