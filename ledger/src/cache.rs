//! In-memory LRU caches for hot ledger entities.
//!
//! One bounded cache per hot entity kind. Reads go through the cache
//! (miss-loading from storage); the append path overwrites entries for every
//! key it touches, strictly after its write transaction commits. Entries are
//! never invalidated otherwise — only [`StateCaches::clear`] during a
//! rollback drops them wholesale.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::RwLock;

use tidemark_store::asset::{AssetInfoRecord, AssetQuantityRecord};
use tidemark_store::balance::BalanceRecord;
use tidemark_types::{Address, AssetId};

use crate::LedgerConfig;

/// Bounded caches for balances, per-asset balances, asset quantities and
/// asset issuance details.
pub struct StateCaches {
    balances: RwLock<LruCache<Address, BalanceRecord>>,
    asset_balances: RwLock<LruCache<(Address, AssetId), i64>>,
    asset_quantities: RwLock<LruCache<AssetId, AssetQuantityRecord>>,
    asset_details: RwLock<LruCache<AssetId, AssetInfoRecord>>,
}

fn cap(entries: usize) -> NonZeroUsize {
    NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN)
}

impl StateCaches {
    /// Create caches sized from the ledger configuration.
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            balances: RwLock::new(LruCache::new(cap(config.balance_cache_size))),
            asset_balances: RwLock::new(LruCache::new(cap(config.asset_balance_cache_size))),
            asset_quantities: RwLock::new(LruCache::new(cap(config.asset_cache_size))),
            asset_details: RwLock::new(LruCache::new(cap(config.asset_cache_size))),
        }
    }

    // ── Balances ────────────────────────────────────────────────────────

    pub fn balance(&self, address: &Address) -> Option<BalanceRecord> {
        self.balances.write().get(address).copied()
    }

    /// Miss-load path: keeps an existing entry if the writer got there
    /// first, so a reader racing an append can never clobber a fresher
    /// value with its own snapshot. Returns the resident entry.
    pub fn load_balance(&self, address: Address, record: BalanceRecord) -> BalanceRecord {
        *self.balances.write().get_or_insert(address, || record)
    }

    /// Writer path: overwrites unconditionally after a commit.
    pub fn put_balance(&self, address: Address, record: BalanceRecord) {
        self.balances.write().put(address, record);
    }

    // ── Per-asset balances ──────────────────────────────────────────────

    pub fn asset_balance(&self, address: &Address, asset: &AssetId) -> Option<i64> {
        self.asset_balances.write().get(&(*address, *asset)).copied()
    }

    pub fn load_asset_balance(&self, address: Address, asset: AssetId, amount: i64) -> i64 {
        *self.asset_balances.write().get_or_insert((address, asset), || amount)
    }

    pub fn put_asset_balance(&self, address: Address, asset: AssetId, amount: i64) {
        self.asset_balances.write().put((address, asset), amount);
    }

    // ── Asset quantity (cumulative total + reissuable flag) ─────────────

    pub fn asset_quantity(&self, asset: &AssetId) -> Option<AssetQuantityRecord> {
        self.asset_quantities.write().get(asset).copied()
    }

    pub fn load_asset_quantity(
        &self,
        asset: AssetId,
        record: AssetQuantityRecord,
    ) -> AssetQuantityRecord {
        *self.asset_quantities.write().get_or_insert(asset, || record)
    }

    pub fn put_asset_quantity(&self, asset: AssetId, record: AssetQuantityRecord) {
        self.asset_quantities.write().put(asset, record);
    }

    // ── Asset issuance details (immutable) ──────────────────────────────

    pub fn asset_details(&self, asset: &AssetId) -> Option<AssetInfoRecord> {
        self.asset_details.write().get(asset).cloned()
    }

    pub fn load_asset_details(
        &self,
        asset: AssetId,
        record: AssetInfoRecord,
    ) -> AssetInfoRecord {
        self.asset_details.write().get_or_insert(asset, || record).clone()
    }

    pub fn put_asset_details(&self, asset: AssetId, record: AssetInfoRecord) {
        self.asset_details.write().put(asset, record);
    }

    /// Drop every cached entry (rollback support).
    pub fn clear(&self) {
        self.balances.write().clear();
        self.asset_balances.write().clear();
        self.asset_quantities.write().clear();
        self.asset_details.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_caches() -> StateCaches {
        StateCaches::new(&LedgerConfig {
            balance_cache_size: 2,
            asset_balance_cache_size: 2,
            asset_cache_size: 2,
            ..LedgerConfig::default()
        })
    }

    fn addr(seed: u8) -> Address {
        Address::new([seed; Address::LENGTH])
    }

    #[test]
    fn put_overwrites_unconditionally() {
        let caches = small_caches();
        let a = addr(1);
        caches.put_balance(a, BalanceRecord { regular: 10, effective: 10 });
        caches.put_balance(a, BalanceRecord { regular: 7, effective: 5 });
        assert_eq!(
            caches.balance(&a),
            Some(BalanceRecord { regular: 7, effective: 5 })
        );
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let caches = small_caches();
        caches.put_balance(addr(1), BalanceRecord::default());
        caches.put_balance(addr(2), BalanceRecord::default());

        // Touch addr(1) so addr(2) is the eviction candidate.
        assert!(caches.balance(&addr(1)).is_some());
        caches.put_balance(addr(3), BalanceRecord::default());

        assert!(caches.balance(&addr(1)).is_some());
        assert!(caches.balance(&addr(2)).is_none());
        assert!(caches.balance(&addr(3)).is_some());
    }

    #[test]
    fn load_keeps_a_fresher_resident_entry() {
        let caches = small_caches();
        let a = addr(1);

        // Writer committed and published (7, 7); a reader racing it now
        // arrives with the older snapshot it loaded from storage.
        caches.put_balance(a, BalanceRecord { regular: 7, effective: 7 });
        let resident = caches.load_balance(a, BalanceRecord { regular: 3, effective: 3 });

        assert_eq!(resident, BalanceRecord { regular: 7, effective: 7 });
        assert_eq!(
            caches.balance(&a),
            Some(BalanceRecord { regular: 7, effective: 7 })
        );
    }

    #[test]
    fn clear_drops_everything() {
        let caches = small_caches();
        caches.put_balance(addr(1), BalanceRecord::default());
        caches.put_asset_balance(addr(1), AssetId::new([1; 32]), 5);
        caches.clear();
        assert!(caches.balance(&addr(1)).is_none());
        assert!(caches.asset_balance(&addr(1), &AssetId::new([1; 32])).is_none());
    }
}
