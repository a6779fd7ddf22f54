//! LMDB implementation of BlockStore.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::block::{BlockRecord, BlockStore};
use tidemark_store::StoreError;
use tidemark_types::{BlockId, Height};

use crate::keys::{height_key, height_suffix};
use crate::LmdbError;

pub struct LmdbBlockStore {
    pub(crate) env: Env,
    pub(crate) blocks_db: Database<Bytes, Bytes>,
    pub(crate) block_heights_db: Database<Bytes, Bytes>,
}

impl BlockStore for LmdbBlockStore {
    fn block_at(&self, height: Height) -> Result<Option<BlockRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let record = match self
            .blocks_db
            .get(&rtxn, &height_key(height))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(bincode::deserialize(bytes).map_err(LmdbError::from)?),
            None => None,
        };
        Ok(record)
    }

    fn height_of(&self, id: &BlockId) -> Result<Option<Height>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .block_heights_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption(format!("block height entry for {id} is not 8 bytes"))
                })?;
                Ok(Some(Height::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    fn last_height(&self) -> Result<Height, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.blocks_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((key, _)) => height_suffix(key),
            None => Ok(0),
        }
    }

    fn block_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.blocks_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
