//! LMDB implementation of BalanceStore.
//!
//! Three databases:
//! - `balances`: `addr(26) ++ height(8)` → bincode `BalanceRecord` (point
//!   snapshots).
//! - `asset_balances`: `addr(26) ++ asset(32) ++ height(8)` → i64 big-endian
//!   (point snapshots, non-negative by append-time invariant).
//! - `lease_balances`: `addr(26) ++ height(8)` → bincode
//!   `LeaseBalanceRecord` (cumulative totals).

use std::collections::BTreeMap;
use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, Env};

use tidemark_store::balance::{BalanceRecord, BalanceStore, LeaseBalanceRecord};
use tidemark_store::{HeightBound, StoreError, Versioned};
use tidemark_types::{Address, AssetId, Height};

use crate::keys::{addr_height_key, height_at, latest_le, scan_limit};
use crate::LmdbError;

pub struct LmdbBalanceStore {
    pub(crate) env: Env,
    pub(crate) balances_db: Database<Bytes, Bytes>,
    pub(crate) asset_balances_db: Database<Bytes, Bytes>,
    pub(crate) lease_balances_db: Database<Bytes, Bytes>,
}

impl BalanceStore for LmdbBalanceStore {
    fn balance_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<Option<Versioned<BalanceRecord>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match latest_le(&self.balances_db, &rtxn, address.as_bytes(), scan_limit(bound))? {
            Some((height, bytes)) => {
                let record = bincode::deserialize(&bytes).map_err(LmdbError::from)?;
                Ok(Some(Versioned::new(height, record)))
            }
            None => Ok(None),
        }
    }

    fn balance_history(
        &self,
        address: &Address,
        from: Height,
        to: Height,
    ) -> Result<Vec<Versioned<BalanceRecord>>, StoreError> {
        let lo = addr_height_key(address, from);
        let hi = addr_height_key(address, to);
        let bounds = (Bound::Included(lo.as_slice()), Bound::Included(hi.as_slice()));

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .balances_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut rows = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let height = height_at(key, Address::LENGTH)?;
            let record = bincode::deserialize(value).map_err(LmdbError::from)?;
            rows.push(Versioned::new(height, record));
        }
        Ok(rows)
    }

    fn lease_balance_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<Option<Versioned<LeaseBalanceRecord>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match latest_le(
            &self.lease_balances_db,
            &rtxn,
            address.as_bytes(),
            scan_limit(bound),
        )? {
            Some((height, bytes)) => {
                let record = bincode::deserialize(&bytes).map_err(LmdbError::from)?;
                Ok(Some(Versioned::new(height, record)))
            }
            None => Ok(None),
        }
    }

    fn asset_balance_at(
        &self,
        address: &Address,
        asset: &AssetId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<i64>>, StoreError> {
        let mut prefix = Vec::with_capacity(Address::LENGTH + 32);
        prefix.extend_from_slice(address.as_bytes());
        prefix.extend_from_slice(asset.as_bytes());

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match latest_le(&self.asset_balances_db, &rtxn, &prefix, scan_limit(bound))? {
            Some((height, bytes)) => Ok(Some(Versioned::new(height, decode_amount(&bytes)?))),
            None => Ok(None),
        }
    }

    fn asset_balances_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<BTreeMap<AssetId, i64>, StoreError> {
        let limit = scan_limit(bound);
        let lo = address.as_bytes().as_slice();
        let mut hi = address.as_bytes().to_vec();
        hi.extend_from_slice(&[0xFF; 32]);
        hi.extend_from_slice(&Height::MAX.to_be_bytes());
        let bounds = (Bound::Included(lo), Bound::Included(hi.as_slice()));

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .asset_balances_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;

        // Keys sort by (asset, height) within the address prefix, so within
        // each asset the last row at or below the limit wins.
        let mut latest: BTreeMap<AssetId, i64> = BTreeMap::new();
        for entry in iter {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let height = height_at(key, Address::LENGTH + 32)?;
            if height > limit {
                continue;
            }
            let asset_bytes = key
                .get(Address::LENGTH..Address::LENGTH + 32)
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "asset balance key too short: {} bytes",
                        key.len()
                    ))
                })?;
            let asset = AssetId::from_bytes(asset_bytes)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
            latest.insert(asset, decode_amount(value)?);
        }
        latest.retain(|_, amount| *amount != 0);
        Ok(latest)
    }
}

fn decode_amount(bytes: &[u8]) -> Result<i64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Corruption("asset balance value is not 8 bytes".into()))?;
    Ok(i64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn addr(seed: u8) -> Address {
        Address::new([seed; Address::LENGTH])
    }

    fn put_balance(env: &LmdbEnvironment, address: &Address, height: Height, regular: i64, effective: i64) {
        let mut batch = env.write_batch().expect("write_batch");
        batch
            .put_balance(address, height, &BalanceRecord { regular, effective })
            .expect("put_balance");
        batch.commit().expect("commit");
    }

    #[test]
    fn balance_at_returns_latest_at_or_below_bound() {
        let (_dir, env) = temp_env();
        let a = addr(1);
        put_balance(&env, &a, 2, 100, 100);
        put_balance(&env, &a, 5, 70, 60);

        let store = env.balance_store();
        let row = store
            .balance_at(&a, HeightBound::AtMost(4))
            .expect("query")
            .expect("row at height 2");
        assert_eq!(row.height, 2);
        assert_eq!(row.value, BalanceRecord { regular: 100, effective: 100 });

        let row = store
            .balance_at(&a, HeightBound::Latest)
            .expect("query")
            .expect("row at height 5");
        assert_eq!(row.height, 5);
        assert_eq!(row.value.effective, 60);

        assert!(store
            .balance_at(&a, HeightBound::AtMost(1))
            .expect("query")
            .is_none());
    }

    #[test]
    fn balance_rows_do_not_leak_across_addresses() {
        let (_dir, env) = temp_env();
        put_balance(&env, &addr(1), 3, 10, 10);
        put_balance(&env, &addr(2), 3, 20, 20);

        let store = env.balance_store();
        let row = store
            .balance_at(&addr(1), HeightBound::Latest)
            .expect("query")
            .expect("row");
        assert_eq!(row.value.regular, 10);
        assert!(store
            .balance_at(&addr(3), HeightBound::Latest)
            .expect("query")
            .is_none());
    }

    #[test]
    fn effective_balance_window_takes_min_from_anchor() {
        let (_dir, env) = temp_env();
        let a = addr(7);
        // Worked example: rows at heights 10 (eff 50), 12 (eff 30), 15 (eff 80);
        // window at=15, confirmations=5 anchors at 10 and takes the min → 30.
        put_balance(&env, &a, 10, 50, 50);
        put_balance(&env, &a, 12, 30, 30);
        put_balance(&env, &a, 15, 80, 80);

        let store = env.balance_store();
        assert_eq!(store.effective_balance_window(&a, 15, 5).expect("window"), 30);
    }

    #[test]
    fn effective_balance_window_without_anchor_is_zero() {
        let (_dir, env) = temp_env();
        let a = addr(8);
        put_balance(&env, &a, 14, 500, 500);

        let store = env.balance_store();
        // No row at or below height 10, so the account has not sustained
        // anything over the window.
        assert_eq!(store.effective_balance_window(&a, 15, 5).expect("window"), 0);
        // Window reaching below genesis is also zero.
        assert_eq!(store.effective_balance_window(&a, 3, 50).expect("window"), 0);
    }

    #[test]
    fn asset_balances_map_keeps_latest_and_drops_zeros() {
        let (_dir, env) = temp_env();
        let a = addr(9);
        let x = AssetId::new([0xAA; 32]);
        let y = AssetId::new([0xBB; 32]);

        let mut batch = env.write_batch().expect("write_batch");
        batch.put_asset_balance(&a, &x, 1, 100).expect("put");
        batch.put_asset_balance(&a, &y, 1, 5).expect("put");
        batch.put_asset_balance(&a, &x, 3, 40).expect("put");
        batch.put_asset_balance(&a, &y, 4, 0).expect("put");
        batch.commit().expect("commit");

        let store = env.balance_store();
        let map = store.asset_balances_at(&a, HeightBound::Latest).expect("map");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&x), Some(&40));

        // Bounded below the zeroing row, y is visible again.
        let map = store.asset_balances_at(&a, HeightBound::AtMost(2)).expect("map");
        assert_eq!(map.get(&x), Some(&100));
        assert_eq!(map.get(&y), Some(&5));
    }
}
