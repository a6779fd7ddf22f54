//! The ledger state facade: append coordinator, height counter, entity
//! caches, and the point-in-time query surface.
//!
//! One writer, many readers. Appends are serialized by an internal mutex and
//! commit all derived rows in a single storage transaction; the height
//! counter and the caches are updated strictly after the commit, so a reader
//! either sees a block completely or not at all. Readers take no lock the
//! writer holds — storage reads run on LMDB's MVCC snapshots and cache reads
//! only contend on the per-cache locks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use tidemark_store::asset::{AssetInfoRecord, AssetQuantityRecord};
use tidemark_store::balance::{BalanceRecord, LeaseBalanceRecord};
use tidemark_store::order::FilledQuantityRecord;
use tidemark_store::tx_index::{AddressTxEntry, TransactionRecord};
use tidemark_store::{
    AliasStore, AssetStore, BalanceStore, BlockStore, HeightBound, LeaseStore, OrderFillStore,
    TxIndexStore,
};
use tidemark_store_lmdb::LmdbEnvironment;
use tidemark_types::{
    Address, Alias, AssetId, AssetQuantityDelta, Block, BlockDiff, BlockId, ExchangeData, Height,
    LeaseId, OrderId, TransferData, TxId,
};

use crate::cache::StateCaches;
use crate::config::LedgerConfig;
use crate::indexer;
use crate::LedgerError;

use std::collections::BTreeMap;

/// Combined public view of an asset: immutable issuance facts plus the
/// current quantity and reissuability from the latest quantity row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDescription {
    pub issuer: Address,
    pub name: String,
    pub description: String,
    pub decimals: u8,
    pub reissuable: bool,
    pub quantity: i64,
}

/// Combined public view of a lease: creation facts plus its current
/// activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseDetails {
    pub sender: Address,
    pub recipient: Address,
    pub amount: i64,
    pub height: Height,
    pub active: bool,
}

/// The height-versioned ledger state.
///
/// Owns the height counter and the entity caches exclusively; every read and
/// write goes through this type.
pub struct LedgerState {
    env: LmdbEnvironment,
    height: AtomicU64,
    caches: StateCaches,
    append_lock: Mutex<()>,
    index_signal: Notify,
    index_batch_size: usize,
}

impl LedgerState {
    /// Open (or create) the ledger state at the configured data directory,
    /// refreshing the height counter from storage.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
        let height = env.block_store().last_height()?;
        tracing::info!(height, path = %config.data_dir.display(), "opened ledger state");
        Ok(Self {
            env,
            height: AtomicU64::new(height),
            caches: StateCaches::new(&config),
            append_lock: Mutex::new(()),
            index_signal: Notify::new(),
            index_batch_size: config.index_batch_size,
        })
    }

    /// Current chain height.
    pub fn height(&self) -> Height {
        self.height.load(Ordering::Acquire)
    }

    // ── Append coordinator ──────────────────────────────────────────────

    /// Append one block and its state diff.
    ///
    /// Every derived row is written inside a single storage transaction; any
    /// error (including an integrity violation such as a negative asset
    /// balance) aborts the whole transaction — the height counter does not
    /// advance and no cache is touched, so the block counts as not applied.
    ///
    /// On success the height counter advances, every touched cache key is
    /// overwritten with the value just persisted, and the transaction
    /// indexer is signalled.
    pub fn append(&self, diff: &BlockDiff, block: &Block) -> Result<(), LedgerError> {
        let _guard = self.append_lock.lock();

        let mut batch = self.env.write_batch()?;
        let height = batch.append_block(block)?;

        let mut detail_updates: Vec<(AssetId, AssetInfoRecord)> = Vec::new();
        let mut quantity_updates: Vec<(AssetId, AssetQuantityRecord)> = Vec::new();

        for issue in &diff.issued_assets {
            let info = AssetInfoRecord {
                issuer: issue.issuer,
                name: issue.name.clone(),
                description: issue.description.clone(),
                decimals: issue.decimals,
                issue_height: height,
            };
            batch.put_asset_info(&issue.asset, &info)?;
            let quantity = batch.apply_quantity_delta(
                &AssetQuantityDelta {
                    asset: issue.asset,
                    delta: issue.quantity,
                    reissuable: issue.reissuable,
                },
                height,
            )?;
            detail_updates.push((issue.asset, info));
            quantity_updates.push((issue.asset, quantity));
        }
        for delta in &diff.asset_quantities {
            let quantity = batch.apply_quantity_delta(delta, height)?;
            quantity_updates.push((delta.asset, quantity));
        }
        for fill in &diff.order_fills {
            batch.apply_fill_delta(fill, height)?;
        }
        for lease in &diff.new_leases {
            batch.put_lease_info(lease, height)?;
            batch.put_lease_status(&lease.lease, height, true)?;
        }
        for lease in &diff.cancelled_leases {
            batch.put_lease_status(lease, height, false)?;
        }
        for delta in &diff.lease_deltas {
            batch.apply_lease_delta(delta, height)?;
        }
        for snapshot in &diff.balances {
            batch.put_balance(
                &snapshot.address,
                height,
                &BalanceRecord { regular: snapshot.regular, effective: snapshot.effective },
            )?;
        }
        for snapshot in &diff.asset_balances {
            batch.put_asset_balance_snapshot(snapshot, height)?;
        }
        for alias in &diff.new_aliases {
            batch.put_alias(alias, height)?;
        }
        batch.commit()?;

        // Committed: publish the new height, then refresh the caches with
        // exactly the values persisted above.
        self.height.store(height, Ordering::Release);
        for snapshot in &diff.balances {
            self.caches.put_balance(
                snapshot.address,
                BalanceRecord { regular: snapshot.regular, effective: snapshot.effective },
            );
        }
        for snapshot in &diff.asset_balances {
            self.caches
                .put_asset_balance(snapshot.address, snapshot.asset, snapshot.balance);
        }
        for (asset, record) in quantity_updates {
            self.caches.put_asset_quantity(asset, record);
        }
        for (asset, record) in detail_updates {
            self.caches.put_asset_details(asset, record);
        }
        self.index_signal.notify_one();

        tracing::debug!(height, block = %block.id(), "appended block");
        Ok(())
    }

    /// Roll the ledger back so that the block with the given id is the new
    /// chain head.
    ///
    /// Deletes every row of every family above the target height, resets the
    /// height counter, and drops all cached entries (coarse invalidation —
    /// readers re-load through the caches afterwards). The indexer watermark
    /// is clamped inside the same transaction.
    pub fn rollback_to(&self, id: &BlockId) -> Result<(), LedgerError> {
        let _guard = self.append_lock.lock();

        let target = self
            .env
            .block_store()
            .height_of(id)?
            .ok_or(LedgerError::UnknownBlock(*id))?;

        let mut batch = self.env.write_batch()?;
        batch.purge_above(target)?;
        batch.commit()?;

        self.height.store(target, Ordering::Release);
        self.caches.clear();

        tracing::warn!(target_height = target, block = %id, "rolled back ledger state");
        Ok(())
    }

    // ── Balance queries ─────────────────────────────────────────────────

    /// Regular and effective balance of an address, (0, 0) for an address
    /// with no history.
    pub fn balance(&self, address: &Address) -> Result<BalanceRecord, LedgerError> {
        if let Some(hit) = self.caches.balance(address) {
            return Ok(hit);
        }
        let loaded = self
            .env
            .balance_store()
            .balance_at(address, HeightBound::Latest)?
            .map(|row| row.value)
            .unwrap_or_default();
        Ok(self.caches.load_balance(*address, loaded))
    }

    /// Balance of one asset for an address, 0 when the address never held
    /// the asset.
    pub fn asset_balance(&self, address: &Address, asset: &AssetId) -> Result<i64, LedgerError> {
        if let Some(hit) = self.caches.asset_balance(address, asset) {
            return Ok(hit);
        }
        let loaded = self
            .env
            .balance_store()
            .asset_balance_at(address, asset, HeightBound::Latest)?
            .map(|row| row.value)
            .unwrap_or_default();
        Ok(self.caches.load_asset_balance(*address, *asset, loaded))
    }

    /// Latest balances of every asset the address holds (zero balances
    /// omitted).
    pub fn asset_balances(&self, address: &Address) -> Result<BTreeMap<AssetId, i64>, LedgerError> {
        Ok(self
            .env
            .balance_store()
            .asset_balances_at(address, HeightBound::Latest)?)
    }

    /// Current lease in/out totals for an address, (0, 0) by default.
    pub fn lease_balance(&self, address: &Address) -> Result<LeaseBalanceRecord, LedgerError> {
        Ok(self
            .env
            .balance_store()
            .lease_balance_at(address, HeightBound::Latest)?
            .map(|row| row.value)
            .unwrap_or_default())
    }

    /// Minimum effective balance sustained over the confirmation window
    /// ending at `at`; 0 without a full window.
    pub fn effective_balance_with_confirmations(
        &self,
        address: &Address,
        at: Height,
        confirmations: Height,
    ) -> Result<i64, LedgerError> {
        Ok(self
            .env
            .balance_store()
            .effective_balance_window(address, at, confirmations)?)
    }

    // ── Asset queries ───────────────────────────────────────────────────

    /// Issuance facts plus current quantity and reissuability, or `None` for
    /// an unknown asset.
    pub fn asset_description(
        &self,
        asset: &AssetId,
    ) -> Result<Option<AssetDescription>, LedgerError> {
        let info = match self.caches.asset_details(asset) {
            Some(hit) => hit,
            None => match self.env.asset_store().asset_info(asset)? {
                Some(loaded) => self.caches.load_asset_details(*asset, loaded),
                None => return Ok(None),
            },
        };
        let quantity = match self.caches.asset_quantity(asset) {
            Some(hit) => hit,
            None => {
                let loaded = self
                    .env
                    .asset_store()
                    .quantity_at(asset, HeightBound::Latest)?
                    .map(|row| row.value)
                    .unwrap_or(AssetQuantityRecord { quantity: 0, reissuable: false });
                self.caches.load_asset_quantity(*asset, loaded)
            }
        };
        Ok(Some(AssetDescription {
            issuer: info.issuer,
            name: info.name,
            description: info.description,
            decimals: info.decimals,
            reissuable: quantity.reissuable,
            quantity: quantity.quantity,
        }))
    }

    // ── Lease queries ───────────────────────────────────────────────────

    /// Ids of every lease whose whole status history is active.
    pub fn active_leases(&self) -> Result<Vec<LeaseId>, LedgerError> {
        Ok(self.env.lease_store().active_leases()?)
    }

    /// Creation facts and current activity for a lease, or `None` for an
    /// unknown id.
    pub fn lease_details(&self, lease: &LeaseId) -> Result<Option<LeaseDetails>, LedgerError> {
        let store = self.env.lease_store();
        let info = match store.lease_info(lease)? {
            Some(info) => info,
            None => return Ok(None),
        };
        let active = store.is_active(lease)?;
        Ok(Some(LeaseDetails {
            sender: info.sender,
            recipient: info.recipient,
            amount: info.amount,
            height: info.height,
            active,
        }))
    }

    // ── Alias queries ───────────────────────────────────────────────────

    /// The address an alias resolves to, if the alias exists.
    pub fn resolve_alias(&self, alias: &Alias) -> Result<Option<Address>, LedgerError> {
        Ok(self.env.alias_store().resolve(alias)?)
    }

    /// Every alias bound to an address.
    pub fn aliases_of(&self, address: &Address) -> Result<Vec<Alias>, LedgerError> {
        Ok(self.env.alias_store().aliases_of(address)?)
    }

    // ── Order queries ───────────────────────────────────────────────────

    /// Cumulative filled volume and fee for an order, (0, 0) by default.
    pub fn filled_volume_and_fee(
        &self,
        order: &OrderId,
    ) -> Result<FilledQuantityRecord, LedgerError> {
        Ok(self.env.order_fill_store().filled_volume_and_fee(order)?)
    }

    // ── Secondary index queries (eventually consistent) ─────────────────

    /// Greatest height whose transactions have been indexed.
    pub fn indexed_height(&self) -> Result<Height, LedgerError> {
        Ok(self.env.tx_index_store().indexed_height()?)
    }

    /// Generic index record for a transaction, if indexed yet.
    pub fn transaction(&self, id: &TxId) -> Result<Option<TransactionRecord>, LedgerError> {
        Ok(self.env.tx_index_store().transaction(id)?)
    }

    /// Transfer detail row for an indexed transfer transaction.
    pub fn transfer_details(&self, id: &TxId) -> Result<Option<TransferData>, LedgerError> {
        Ok(self.env.tx_index_store().transfer_details(id)?)
    }

    /// Exchange detail row for an indexed exchange transaction.
    pub fn exchange_details(&self, id: &TxId) -> Result<Option<ExchangeData>, LedgerError> {
        Ok(self.env.tx_index_store().exchange_details(id)?)
    }

    /// Up to `limit` indexed transactions touching an address, oldest first.
    pub fn transactions_of(
        &self,
        address: &Address,
        limit: usize,
    ) -> Result<Vec<AddressTxEntry>, LedgerError> {
        Ok(self.env.tx_index_store().transactions_of(address, limit)?)
    }

    // ── Indexer wiring ──────────────────────────────────────────────────

    /// Spawn the background transaction indexer. It waits for the append
    /// signal, catches up in bounded batches, and exits when the shutdown
    /// channel fires.
    pub fn spawn_indexer(
        self: &Arc<Self>,
        shutdown: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move { indexer::run(state, shutdown).await })
    }

    pub(crate) fn env(&self) -> &LmdbEnvironment {
        &self.env
    }

    pub(crate) fn index_signal(&self) -> &Notify {
        &self.index_signal
    }

    pub(crate) fn index_batch_size(&self) -> usize {
        self.index_batch_size
    }
}
