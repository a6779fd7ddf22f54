//! LMDB implementation of OrderFillStore.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::order::{FilledQuantityRecord, OrderFillStore};
use tidemark_store::{HeightBound, StoreError, Versioned};
use tidemark_types::OrderId;

use crate::keys::{latest_le, scan_limit};
use crate::LmdbError;

pub struct LmdbOrderFillStore {
    pub(crate) env: Env,
    pub(crate) filled_quantities_db: Database<Bytes, Bytes>,
}

impl OrderFillStore for LmdbOrderFillStore {
    fn filled_at(
        &self,
        order: &OrderId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<FilledQuantityRecord>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match latest_le(
            &self.filled_quantities_db,
            &rtxn,
            order.as_bytes(),
            scan_limit(bound),
        )? {
            Some((height, bytes)) => {
                let record = bincode::deserialize(&bytes).map_err(LmdbError::from)?;
                Ok(Some(Versioned::new(height, record)))
            }
            None => Ok(None),
        }
    }
}
