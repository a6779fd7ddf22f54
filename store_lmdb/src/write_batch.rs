//! Write batching — groups every row derived from one block append into a
//! single LMDB write transaction, so a block commits atomically and the one
//! fsync is amortised over all of its rows.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! let height = batch.append_block(&block)?;
//! batch.put_balance(&addr, height, &record)?;
//! batch.apply_lease_delta(&delta, height)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).
//!
//! The cumulative families (lease balances, asset quantities, order fills,
//! block scores) resolve their prior latest row and write `prior + delta`
//! inside this same transaction — callers never read-then-write across two
//! round trips, so a torn accumulator row cannot exist.

use std::ops::Bound;

use heed::types::Bytes;
use heed::RwTxn;

use tidemark_store::asset::{AssetInfoRecord, AssetQuantityRecord};
use tidemark_store::balance::{BalanceRecord, LeaseBalanceRecord};
use tidemark_store::block::BlockRecord;
use tidemark_store::lease::LeaseInfoRecord;
use tidemark_store::order::FilledQuantityRecord;
use tidemark_store::alias::AliasRecord;
use tidemark_store::tx_index::{AddressTxEntry, TransactionRecord};
use tidemark_store::StoreError;
use tidemark_types::{
    Address, AliasCreate, AssetBalanceSnapshot, AssetId, AssetQuantityDelta, Block, ExchangeData,
    Height, LeaseCreate, LeaseDelta, LeaseId, OrderFillDelta, TransferData, TxId,
};

use crate::environment::LmdbEnvironment;
use crate::keys::{
    addr_alias_key, addr_asset_height_key, addr_height_key, addr_height_tx_key, height_at,
    height_key, height_suffix, id_height_key, latest_le,
};
use crate::meta::INDEXED_HEIGHT_KEY;
use crate::LmdbError;

/// A write batch that groups multiple store operations into a single LMDB
/// write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    // ── Block operations ────────────────────────────────────────────────

    /// Persist a block at the next height.
    ///
    /// The new height is derived from the greatest committed block key, and
    /// the stored cumulative score is the prior cumulative score plus this
    /// block's own score, both resolved inside this transaction. Returns the
    /// height assigned to the block.
    pub fn append_block(&mut self, block: &Block) -> Result<Height, StoreError> {
        let (last_height, prior_score) =
            match self.env.blocks_db.last(&self.txn).map_err(LmdbError::from)? {
                Some((key, value)) => {
                    let height = height_suffix(key)?;
                    let record: BlockRecord =
                        bincode::deserialize(value).map_err(LmdbError::from)?;
                    (height, record.cumulative_score)
                }
                None => (0, 0),
            };
        let new_height = last_height + 1;

        let record = BlockRecord {
            id: block.header.id,
            reference: block.header.reference,
            timestamp: block.header.timestamp,
            generator: block.header.generator,
            cumulative_score: prior_score.saturating_add(block.header.score),
            bytes: block.bytes.clone(),
        };
        let value = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.env
            .blocks_db
            .put(&mut self.txn, &height_key(new_height), &value)
            .map_err(LmdbError::from)?;
        self.env
            .block_heights_db
            .put(&mut self.txn, block.header.id.as_bytes(), &new_height.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(new_height)
    }

    // ── Point snapshot operations ───────────────────────────────────────

    /// Put a balance snapshot row for an address.
    pub fn put_balance(
        &mut self,
        address: &Address,
        height: Height,
        record: &BalanceRecord,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .balances_db
            .put(&mut self.txn, &addr_height_key(address, height), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put a per-asset balance snapshot row.
    ///
    /// A negative balance is an integrity violation: the error aborts the
    /// whole batch, so no row of the offending block survives.
    pub fn put_asset_balance(
        &mut self,
        address: &Address,
        asset: &AssetId,
        height: Height,
        amount: i64,
    ) -> Result<(), StoreError> {
        if amount < 0 {
            return Err(StoreError::IntegrityViolation(format!(
                "negative asset balance {amount} for address {address}, asset {asset}"
            )));
        }
        self.env
            .asset_balances_db
            .put(
                &mut self.txn,
                &addr_asset_height_key(address, asset.as_bytes(), height),
                &amount.to_be_bytes(),
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put an asset balance snapshot from a diff entry.
    pub fn put_asset_balance_snapshot(
        &mut self,
        snapshot: &AssetBalanceSnapshot,
        height: Height,
    ) -> Result<(), StoreError> {
        self.put_asset_balance(&snapshot.address, &snapshot.asset, height, snapshot.balance)
    }

    // ── Cumulative delta operations ─────────────────────────────────────

    /// Fold a lease in/out delta onto the address's latest totals and write
    /// the new row. Returns the written totals.
    pub fn apply_lease_delta(
        &mut self,
        delta: &LeaseDelta,
        height: Height,
    ) -> Result<LeaseBalanceRecord, StoreError> {
        let prior: LeaseBalanceRecord = match latest_le(
            &self.env.lease_balances_db,
            &self.txn,
            delta.address.as_bytes(),
            height,
        )? {
            Some((_, bytes)) => bincode::deserialize(&bytes).map_err(LmdbError::from)?,
            None => LeaseBalanceRecord::default(),
        };
        let next = LeaseBalanceRecord {
            lease_in: prior.lease_in.saturating_add(delta.in_delta),
            lease_out: prior.lease_out.saturating_add(delta.out_delta),
        };
        let value = bincode::serialize(&next).map_err(LmdbError::from)?;
        self.env
            .lease_balances_db
            .put(&mut self.txn, &addr_height_key(&delta.address, height), &value)
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    /// Fold a quantity delta onto the asset's latest total and write the new
    /// row, recording the reissuable flag alongside. Returns the written row.
    pub fn apply_quantity_delta(
        &mut self,
        delta: &AssetQuantityDelta,
        height: Height,
    ) -> Result<AssetQuantityRecord, StoreError> {
        let prior_quantity = match latest_le(
            &self.env.asset_quantities_db,
            &self.txn,
            delta.asset.as_bytes(),
            height,
        )? {
            Some((_, bytes)) => {
                let record: AssetQuantityRecord =
                    bincode::deserialize(&bytes).map_err(LmdbError::from)?;
                record.quantity
            }
            None => 0,
        };
        let next = AssetQuantityRecord {
            quantity: prior_quantity.saturating_add(delta.delta),
            reissuable: delta.reissuable,
        };
        let value = bincode::serialize(&next).map_err(LmdbError::from)?;
        self.env
            .asset_quantities_db
            .put(
                &mut self.txn,
                &id_height_key(delta.asset.as_bytes(), height),
                &value,
            )
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    /// Fold a fill delta onto the order's latest totals and write the new
    /// row. Returns the written totals.
    pub fn apply_fill_delta(
        &mut self,
        delta: &OrderFillDelta,
        height: Height,
    ) -> Result<FilledQuantityRecord, StoreError> {
        let prior: FilledQuantityRecord = match latest_le(
            &self.env.filled_quantities_db,
            &self.txn,
            delta.order.as_bytes(),
            height,
        )? {
            Some((_, bytes)) => bincode::deserialize(&bytes).map_err(LmdbError::from)?,
            None => FilledQuantityRecord::default(),
        };
        let next = FilledQuantityRecord {
            volume: prior.volume.saturating_add(delta.volume_delta),
            fee: prior.fee.saturating_add(delta.fee_delta),
        };
        let value = bincode::serialize(&next).map_err(LmdbError::from)?;
        self.env
            .filled_quantities_db
            .put(
                &mut self.txn,
                &id_height_key(delta.order.as_bytes(), height),
                &value,
            )
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    // ── Immutable fact operations ───────────────────────────────────────

    /// Record issuance facts for a newly issued asset.
    pub fn put_asset_info(
        &mut self,
        asset: &AssetId,
        record: &AssetInfoRecord,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .asset_info_db
            .put(&mut self.txn, asset.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Record creation facts for a new lease.
    pub fn put_lease_info(&mut self, create: &LeaseCreate, height: Height) -> Result<(), StoreError> {
        let record = LeaseInfoRecord {
            sender: create.sender,
            recipient: create.recipient,
            amount: create.amount,
            height,
        };
        let value = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.env
            .lease_info_db
            .put(&mut self.txn, create.lease.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Append one status toggle row to a lease's history.
    pub fn put_lease_status(
        &mut self,
        lease: &LeaseId,
        height: Height,
        active: bool,
    ) -> Result<(), StoreError> {
        self.env
            .lease_status_db
            .put(
                &mut self.txn,
                &id_height_key(lease.as_bytes(), height),
                &[u8::from(active)],
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Record an alias binding and its reverse index entry.
    pub fn put_alias(&mut self, create: &AliasCreate, height: Height) -> Result<(), StoreError> {
        let record = AliasRecord { address: create.address, height };
        let value = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.env
            .aliases_db
            .put(&mut self.txn, create.alias.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        self.env
            .address_aliases_db
            .put(
                &mut self.txn,
                &addr_alias_key(&create.address, create.alias.as_str()),
                &[],
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Transaction index operations (background indexer only) ──────────

    /// Put a generic transaction index row.
    pub fn put_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        let value = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .transactions_db
            .put(&mut self.txn, record.id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put a transfer detail row.
    pub fn put_transfer_details(
        &mut self,
        id: &TxId,
        details: &TransferData,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(details).map_err(LmdbError::from)?;
        self.env
            .transfer_details_db
            .put(&mut self.txn, id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put an exchange detail row.
    pub fn put_exchange_details(
        &mut self,
        id: &TxId,
        details: &ExchangeData,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(details).map_err(LmdbError::from)?;
        self.env
            .exchange_details_db
            .put(&mut self.txn, id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put a per-address transaction index entry.
    pub fn put_address_tx(
        &mut self,
        address: &Address,
        entry: &AddressTxEntry,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(entry).map_err(LmdbError::from)?;
        self.env
            .address_transactions_db
            .put(
                &mut self.txn,
                &addr_height_tx_key(address, entry.height, &entry.tx_id),
                &value,
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Advance the indexer watermark.
    pub fn set_indexed_height(&mut self, height: Height) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, INDEXED_HEIGHT_KEY.as_bytes(), &height.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Put a meta key/value pair into the batch.
    pub fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Rollback ────────────────────────────────────────────────────────

    /// Delete every row of every family with height above `target`, clamping
    /// the indexer watermark. Immutable facts (asset info, lease info,
    /// aliases) created above the target are deleted outright; everything
    /// they indexed is gone with the purged heights.
    pub fn purge_above(&mut self, target: Height) -> Result<(), StoreError> {
        let blocks = self.purge_blocks(target)?;

        let mut rows = 0usize;
        for db in [
            self.env.balances_db,
            self.env.lease_balances_db,
            self.env.asset_quantities_db,
            self.env.lease_status_db,
            self.env.filled_quantities_db,
            self.env.asset_balances_db,
        ] {
            rows += self.purge_suffix_keyed(db, target)?;
        }
        rows += self.purge_address_transactions(target)?;
        rows += self.purge_asset_info(target)?;
        rows += self.purge_lease_info(target)?;
        rows += self.purge_aliases(target)?;
        rows += self.purge_transactions(target)?;
        self.clamp_indexed_height(target)?;

        tracing::debug!(target_height = target, blocks, rows, "purged rows above target");
        Ok(())
    }

    fn purge_blocks(&mut self, target: Height) -> Result<usize, StoreError> {
        let mut keys = Vec::new();
        let mut ids = Vec::new();
        {
            let lo = height_key(target + 1);
            let bounds = (Bound::Included(&lo[..]), Bound::<&[u8]>::Unbounded);
            let iter = self
                .env
                .blocks_db
                .range(&self.txn, &bounds)
                .map_err(LmdbError::from)?;
            for entry in iter {
                let (key, value) = entry.map_err(LmdbError::from)?;
                let record: BlockRecord = bincode::deserialize(value).map_err(LmdbError::from)?;
                keys.push(key.to_vec());
                ids.push(record.id);
            }
        }
        for key in &keys {
            self.env
                .blocks_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        for id in &ids {
            self.env
                .block_heights_db
                .delete(&mut self.txn, id.as_bytes())
                .map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    /// Purge a database whose keys end in the big-endian height.
    fn purge_suffix_keyed(
        &mut self,
        db: heed::Database<Bytes, Bytes>,
        target: Height,
    ) -> Result<usize, StoreError> {
        let keys = {
            let iter = db.iter(&self.txn).map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, _) = entry.map_err(LmdbError::from)?;
                if height_suffix(key)? > target {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        for key in &keys {
            db.delete(&mut self.txn, key).map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    fn purge_address_transactions(&mut self, target: Height) -> Result<usize, StoreError> {
        let keys = {
            let iter = self
                .env
                .address_transactions_db
                .iter(&self.txn)
                .map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, _) = entry.map_err(LmdbError::from)?;
                if height_at(key, Address::LENGTH)? > target {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        for key in &keys {
            self.env
                .address_transactions_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    fn purge_asset_info(&mut self, target: Height) -> Result<usize, StoreError> {
        let keys = {
            let iter = self.env.asset_info_db.iter(&self.txn).map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, value) = entry.map_err(LmdbError::from)?;
                let record: AssetInfoRecord =
                    bincode::deserialize(value).map_err(LmdbError::from)?;
                if record.issue_height > target {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        for key in &keys {
            self.env
                .asset_info_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    fn purge_lease_info(&mut self, target: Height) -> Result<usize, StoreError> {
        let keys = {
            let iter = self.env.lease_info_db.iter(&self.txn).map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, value) = entry.map_err(LmdbError::from)?;
                let record: LeaseInfoRecord =
                    bincode::deserialize(value).map_err(LmdbError::from)?;
                if record.height > target {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        for key in &keys {
            self.env
                .lease_info_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    fn purge_aliases(&mut self, target: Height) -> Result<usize, StoreError> {
        let mut alias_keys = Vec::new();
        let mut reverse_keys = Vec::new();
        {
            let iter = self.env.aliases_db.iter(&self.txn).map_err(LmdbError::from)?;
            for entry in iter {
                let (key, value) = entry.map_err(LmdbError::from)?;
                let record: AliasRecord = bincode::deserialize(value).map_err(LmdbError::from)?;
                if record.height > target {
                    let alias = std::str::from_utf8(key).map_err(|_| {
                        StoreError::Corruption("alias key is not valid UTF-8".into())
                    })?;
                    reverse_keys.push(addr_alias_key(&record.address, alias));
                    alias_keys.push(key.to_vec());
                }
            }
        }
        for key in &alias_keys {
            self.env
                .aliases_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        for key in &reverse_keys {
            self.env
                .address_aliases_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(alias_keys.len())
    }

    fn purge_transactions(&mut self, target: Height) -> Result<usize, StoreError> {
        let keys = {
            let iter = self
                .env
                .transactions_db
                .iter(&self.txn)
                .map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, value) = entry.map_err(LmdbError::from)?;
                let record: TransactionRecord =
                    bincode::deserialize(value).map_err(LmdbError::from)?;
                if record.height > target {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        for key in &keys {
            self.env
                .transactions_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
            self.env
                .transfer_details_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
            self.env
                .exchange_details_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(keys.len())
    }

    fn clamp_indexed_height(&mut self, target: Height) -> Result<(), StoreError> {
        let current = match self
            .env
            .meta_db
            .get(&self.txn, INDEXED_HEIGHT_KEY.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("indexed height entry is not 8 bytes".into())
                })?;
                Height::from_be_bytes(arr)
            }
            None => return Ok(()),
        };
        if current > target {
            self.set_indexed_height(target)?;
        }
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use proptest::prelude::*;
    use tidemark_store::{BlockStore, HeightBound, OrderFillStore};
    use tidemark_types::{BlockHeader, BlockId, OrderId};

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 32 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn make_block(seed: u8, score: u128) -> Block {
        Block::new(
            BlockHeader {
                id: BlockId::new([seed; 32]),
                reference: BlockId::new([seed.wrapping_sub(1); 32]),
                timestamp: 1_000 + seed as u64,
                generator: Address::new([0xEE; Address::LENGTH]),
                score,
            },
            vec![seed, seed, seed],
        )
    }

    #[test]
    fn append_block_assigns_sequential_heights_and_accumulates_score() {
        let (_dir, env) = temp_env();

        for seed in 1..=3u8 {
            let mut batch = env.write_batch().expect("write_batch");
            let height = batch.append_block(&make_block(seed, 10)).expect("append");
            assert_eq!(height, seed as u64);
            batch.commit().expect("commit");
        }

        let store = env.block_store();
        assert_eq!(store.last_height().expect("last"), 3);
        assert_eq!(store.block_count().expect("count"), 3);

        let record = store.block_at(3).expect("query").expect("block");
        assert_eq!(record.id, BlockId::new([3; 32]));
        assert_eq!(record.cumulative_score, 30);
        assert_eq!(record.bytes, vec![3, 3, 3]);

        assert_eq!(store.height_of(&BlockId::new([2; 32])).expect("query"), Some(2));
        assert_eq!(store.height_of(&BlockId::new([9; 32])).expect("query"), None);
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();

        {
            let mut batch = env.write_batch().expect("write_batch");
            batch.append_block(&make_block(1, 1)).expect("append");
            // batch is dropped here — implicit rollback
        }

        assert_eq!(env.block_store().last_height().expect("last"), 0);
    }

    #[test]
    fn negative_asset_balance_is_rejected() {
        let (_dir, env) = temp_env();
        let addr = Address::new([1; Address::LENGTH]);
        let asset = AssetId::new([2; 32]);

        let mut batch = env.write_batch().expect("write_batch");
        batch.append_block(&make_block(1, 1)).expect("append");
        let err = batch
            .put_asset_balance(&addr, &asset, 1, -5)
            .expect_err("negative balance must be rejected");
        assert!(matches!(err, StoreError::IntegrityViolation(_)));
        drop(batch);

        // The abort covers the whole batch: the block is gone too.
        assert_eq!(env.block_store().last_height().expect("last"), 0);
    }

    #[test]
    fn purge_above_removes_rows_and_clamps_watermark() {
        let (_dir, env) = temp_env();
        let addr = Address::new([1; Address::LENGTH]);
        let asset = AssetId::new([2; 32]);
        let lease = LeaseId::new([3; 32]);

        for seed in 1..=3u8 {
            let height = seed as u64;
            let mut batch = env.write_batch().expect("write_batch");
            batch.append_block(&make_block(seed, 1)).expect("append");
            batch
                .put_balance(&addr, height, &BalanceRecord { regular: 10 * height as i64, effective: 10 })
                .expect("balance");
            batch.put_asset_balance(&addr, &asset, height, height as i64).expect("asset balance");
            batch.put_lease_status(&lease, height, true).expect("status");
            batch.set_indexed_height(height).expect("watermark");
            batch.commit().expect("commit");
        }

        let mut batch = env.write_batch().expect("write_batch");
        batch.purge_above(1).expect("purge");
        batch.commit().expect("commit");

        let blocks = env.block_store();
        assert_eq!(blocks.last_height().expect("last"), 1);
        assert_eq!(blocks.height_of(&BlockId::new([3; 32])).expect("query"), None);

        use tidemark_store::BalanceStore;
        let balances = env.balance_store();
        let row = balances
            .balance_at(&addr, HeightBound::Latest)
            .expect("query")
            .expect("row");
        assert_eq!(row.height, 1);
        assert_eq!(
            balances.asset_balance_at(&addr, &asset, HeightBound::Latest).expect("query").map(|v| v.value),
            Some(1)
        );

        use tidemark_store::TxIndexStore;
        assert_eq!(env.tx_index_store().indexed_height().expect("query"), 1);
    }

    #[test]
    fn filled_volume_defaults_then_accumulates() {
        let (_dir, env) = temp_env();
        let order = OrderId::new([7; 32]);

        let mut batch = env.write_batch().expect("write_batch");
        let first = batch
            .apply_fill_delta(&OrderFillDelta { order, volume_delta: 4, fee_delta: 1 }, 1)
            .expect("fill");
        assert_eq!(first, FilledQuantityRecord { volume: 4, fee: 1 });
        batch.commit().expect("commit");

        assert_eq!(
            env.order_fill_store().filled_volume_and_fee(&order).expect("query"),
            FilledQuantityRecord { volume: 4, fee: 1 }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Any sequence of lease deltas folds to its running sum, with the
        /// prior value defaulting to zero before the first row.
        #[test]
        fn lease_deltas_fold_to_running_sum(deltas in proptest::collection::vec(-1_000i64..1_000, 1..12)) {
            let (_dir, env) = temp_env();
            let address = Address::new([0x42; Address::LENGTH]);

            let mut expected_in = 0i64;
            let mut expected_out = 0i64;
            for (i, delta) in deltas.iter().enumerate() {
                let mut batch = env.write_batch().expect("write_batch");
                let row = batch
                    .apply_lease_delta(
                        &LeaseDelta { address, in_delta: *delta, out_delta: -delta },
                        (i + 1) as u64,
                    )
                    .expect("apply");
                batch.commit().expect("commit");

                expected_in += delta;
                expected_out -= delta;
                prop_assert_eq!(row.lease_in, expected_in);
                prop_assert_eq!(row.lease_out, expected_out);
            }

            use tidemark_store::BalanceStore;
            let latest = env
                .balance_store()
                .lease_balance_at(&address, HeightBound::Latest)
                .expect("query")
                .expect("row");
            prop_assert_eq!(latest.value.lease_in, expected_in);
            prop_assert_eq!(latest.value.lease_out, expected_out);
        }
    }
}
