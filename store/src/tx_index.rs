//! Secondary transaction index traits.
//!
//! These tables are populated asynchronously by the background indexer and
//! lag the block log by a monotonically shrinking window. Consumers must
//! tolerate eventual, not immediate, consistency.

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, ExchangeData, Height, Signature, TransferData, TxId, TxType};

use crate::StoreError;

/// Generic index row shared by every transaction type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TxId,
    pub signature: Signature,
    pub tx_type: TxType,
    pub height: Height,
}

/// One entry of the per-address transaction index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressTxEntry {
    pub tx_id: TxId,
    pub signature: Signature,
    pub height: Height,
}

/// Trait for reading the asynchronously built transaction indices.
pub trait TxIndexStore {
    /// Greatest height whose transactions have been indexed; 0 before the
    /// indexer has processed anything.
    fn indexed_height(&self) -> Result<Height, StoreError>;

    /// Generic record for a transaction id, if it has been indexed yet.
    fn transaction(&self, id: &TxId) -> Result<Option<TransactionRecord>, StoreError>;

    /// Transfer detail row, for indexed transfer transactions.
    fn transfer_details(&self, id: &TxId) -> Result<Option<TransferData>, StoreError>;

    /// Exchange detail row, for indexed exchange transactions.
    fn exchange_details(&self, id: &TxId) -> Result<Option<ExchangeData>, StoreError>;

    /// Up to `limit` indexed transactions touching the address, ascending by
    /// height.
    fn transactions_of(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<AddressTxEntry>, StoreError>;
}
