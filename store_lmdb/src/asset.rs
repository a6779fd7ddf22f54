//! LMDB implementation of AssetStore.

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::asset::{AssetInfoRecord, AssetQuantityRecord, AssetStore};
use tidemark_store::{HeightBound, StoreError, Versioned};
use tidemark_types::AssetId;

use crate::keys::{latest_le, scan_limit};
use crate::LmdbError;

pub struct LmdbAssetStore {
    pub(crate) env: Env,
    pub(crate) asset_info_db: Database<Bytes, Bytes>,
    pub(crate) asset_quantities_db: Database<Bytes, Bytes>,
}

impl AssetStore for LmdbAssetStore {
    fn asset_info(&self, asset: &AssetId) -> Result<Option<AssetInfoRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .asset_info_db
            .get(&rtxn, asset.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn quantity_at(
        &self,
        asset: &AssetId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<AssetQuantityRecord>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match latest_le(
            &self.asset_quantities_db,
            &rtxn,
            asset.as_bytes(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tidemark_types::{Address, AssetQuantityDelta};

    #[test]
    fn quantity_history_is_cumulative_and_bounded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        let asset = AssetId::new([5; 32]);

        let mut batch = env.write_batch().expect("write_batch");
        batch
            .put_asset_info(
                &asset,
                &AssetInfoRecord {
                    issuer: Address::new([1; Address::LENGTH]),
                    name: "token".into(),
                    description: String::new(),
                    decimals: 8,
                    issue_height: 3,
                },
            )
            .expect("put info");
        batch
            .apply_quantity_delta(
                &AssetQuantityDelta { asset, delta: 1000, reissuable: true },
                3,
            )
            .expect("seed quantity");
        batch.commit().expect("commit");

        let mut batch = env.write_batch().expect("write_batch");
        let row = batch
            .apply_quantity_delta(
                &AssetQuantityDelta { asset, delta: 500, reissuable: true },
                4,
            )
            .expect("reissue");
        assert_eq!(row.quantity, 1500);
        batch.commit().expect("commit");

        let store = env.asset_store();
        let latest = store
            .quantity_at(&asset, HeightBound::Latest)
            .expect("query")
            .expect("row");
        assert_eq!(latest.height, 4);
        assert_eq!(latest.value.quantity, 1500);
        assert!(latest.value.reissuable);

        let at_issue = store
            .quantity_at(&asset, HeightBound::AtMost(3))
            .expect("query")
            .expect("row");
        assert_eq!(at_issue.value.quantity, 1000);

        let info = store.asset_info(&asset).expect("query").expect("info");
        assert_eq!(info.issue_height, 3);
        assert_eq!(info.decimals, 8);
    }
}
