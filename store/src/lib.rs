//! Abstract storage traits for the tidemark ledger store.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the workspace depends only on the traits; the one
//! exception is the write path, which goes through the backend's own write
//! batch so that a whole block append commits as a single transaction.
//!
//! All history queries share one shape: "the row with the greatest height at
//! or below a bound". Absence of a row is never an error — it resolves to
//! `None` or a documented zero default.

pub mod alias;
pub mod asset;
pub mod balance;
pub mod block;
pub mod error;
pub mod lease;
pub mod meta;
pub mod order;
pub mod tx_index;

pub use alias::{AliasRecord, AliasStore};
pub use asset::{AssetInfoRecord, AssetQuantityRecord, AssetStore};
pub use balance::{BalanceRecord, BalanceStore, LeaseBalanceRecord};
pub use block::{BlockRecord, BlockStore};
pub use error::StoreError;
pub use lease::{LeaseInfoRecord, LeaseStore};
pub use meta::MetaStore;
pub use order::{FilledQuantityRecord, OrderFillStore};
pub use tx_index::{AddressTxEntry, TransactionRecord, TxIndexStore};

use tidemark_types::Height;

/// Upper bound on the height axis for a point-in-time query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeightBound {
    /// The current chain height — "now".
    Latest,
    /// At most the given height.
    AtMost(Height),
}

/// A value together with the height of the history row it was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    pub height: Height,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(height: Height, value: T) -> Self {
        Self { height, value }
    }
}
