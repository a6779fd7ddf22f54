//! LMDB implementation of TxIndexStore.
//!
//! All four databases here are written only by the background indexer, one
//! write batch per block, so readers either see a block's transactions
//! completely or not at all. The `indexed_height` meta key is the watermark
//! separating indexed from pending heights.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::tx_index::{AddressTxEntry, TransactionRecord, TxIndexStore};
use tidemark_store::StoreError;
use tidemark_types::{Address, ExchangeData, Height, TransferData, TxId};

use crate::keys::{prefix_bounds, prefix_upper_bound};
use crate::meta::INDEXED_HEIGHT_KEY;
use crate::LmdbError;

pub struct LmdbTxIndexStore {
    pub(crate) env: Env,
    pub(crate) transactions_db: Database<Bytes, Bytes>,
    pub(crate) transfer_details_db: Database<Bytes, Bytes>,
    pub(crate) exchange_details_db: Database<Bytes, Bytes>,
    pub(crate) address_transactions_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl TxIndexStore for LmdbTxIndexStore {
    fn indexed_height(&self) -> Result<Height, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, INDEXED_HEIGHT_KEY.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("indexed height entry is not 8 bytes".into())
                })?;
                Ok(Height::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn transaction(&self, id: &TxId) -> Result<Option<TransactionRecord>, StoreError> {
        self.get_record(&self.transactions_db, id)
    }

    fn transfer_details(&self, id: &TxId) -> Result<Option<TransferData>, StoreError> {
        self.get_record(&self.transfer_details_db, id)
    }

    fn exchange_details(&self, id: &TxId) -> Result<Option<ExchangeData>, StoreError> {
        self.get_record(&self.exchange_details_db, id)
    }

    fn transactions_of(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<AddressTxEntry>, StoreError> {
        let prefix = address.as_bytes().as_slice();
        let upper = prefix_upper_bound(prefix);
        let bounds = prefix_bounds(prefix, &upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .address_transactions_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for entry in iter {
            if entries.len() >= limit {
                break;
            }
            let (_, value) = entry.map_err(LmdbError::from)?;
            entries.push(bincode::deserialize(value).map_err(LmdbError::from)?);
        }
        Ok(entries)
    }
}

impl LmdbTxIndexStore {
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        db: &Database<Bytes, Bytes>,
        id: &TxId,
    ) -> Result<Option<T>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match db.get(&rtxn, id.as_bytes()).map_err(LmdbError::from)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tidemark_types::{Signature, TxType};

    #[test]
    fn indexed_height_defaults_to_zero() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        assert_eq!(env.tx_index_store().indexed_height().expect("query"), 0);
    }

    #[test]
    fn address_index_is_chronological_and_bounded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        let addr = Address::new([1; Address::LENGTH]);

        let mut batch = env.write_batch().expect("write_batch");
        for (height, seed) in [(2u64, 0xB0u8), (1, 0xA0), (3, 0xC0)] {
            let id = TxId::new([seed; 32]);
            batch
                .put_transaction(&TransactionRecord {
                    id,
                    signature: Signature::ZERO,
                    tx_type: TxType::Payment,
                    height,
                })
                .expect("put tx");
            batch
                .put_address_tx(
                    &addr,
                    &AddressTxEntry { tx_id: id, signature: Signature::ZERO, height },
                )
                .expect("put index");
        }
        batch.set_indexed_height(3).expect("watermark");
        batch.commit().expect("commit");

        let store = env.tx_index_store();
        assert_eq!(store.indexed_height().expect("query"), 3);

        let entries = store.transactions_of(&addr, 10).expect("query");
        let heights: Vec<u64> = entries.iter().map(|e| e.height).collect();
        assert_eq!(heights, vec![1, 2, 3]);

        let capped = store.transactions_of(&addr, 2).expect("query");
        assert_eq!(capped.len(), 2);

        let record = store
            .transaction(&TxId::new([0xA0; 32]))
            .expect("query")
            .expect("record");
        assert_eq!(record.height, 1);
        assert_eq!(record.tx_type, TxType::Payment);
    }
}
