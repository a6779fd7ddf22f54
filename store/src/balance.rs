//! Address balance storage traits: point balances, per-asset balances, and
//! cumulative lease in/out totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, AssetId, Height};

use crate::{HeightBound, StoreError, Versioned};

/// Point snapshot of an address's balances, valid as written until a later
/// height supersedes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub regular: i64,
    pub effective: i64,
}

/// Cumulative lease totals for an address. Each history row is the prior
/// latest row plus the block's delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseBalanceRecord {
    pub lease_in: i64,
    pub lease_out: i64,
}

/// Trait for address balance queries.
pub trait BalanceStore {
    /// Latest balance row at or below the bound.
    fn balance_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<Option<Versioned<BalanceRecord>>, StoreError>;

    /// Every balance row for the address with height in `[from, to]`,
    /// ascending by height.
    fn balance_history(
        &self,
        address: &Address,
        from: Height,
        to: Height,
    ) -> Result<Vec<Versioned<BalanceRecord>>, StoreError>;

    /// Latest lease balance row at or below the bound.
    fn lease_balance_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<Option<Versioned<LeaseBalanceRecord>>, StoreError>;

    /// Latest balance of one asset for the address, at or below the bound.
    fn asset_balance_at(
        &self,
        address: &Address,
        asset: &AssetId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<i64>>, StoreError>;

    /// Latest balance of every asset the address has ever held, at or below
    /// the bound. Assets whose latest balance is zero are omitted.
    fn asset_balances_at(
        &self,
        address: &Address,
        bound: HeightBound,
    ) -> Result<BTreeMap<AssetId, i64>, StoreError>;

    /// Minimum effective balance the address sustained over the confirmation
    /// window ending at `at`.
    ///
    /// The anchor is the last balance row at height `at - confirmations` or
    /// earlier; the result is the minimum effective balance over every row in
    /// `[anchor.height, at]`. Without an anchor (the account had no balance
    /// row that early, or the window reaches below the genesis height) the
    /// result is 0, so a freshly funded account cannot satisfy a
    /// consensus-sensitive balance check with a last-minute deposit.
    fn effective_balance_window(
        &self,
        address: &Address,
        at: Height,
        confirmations: Height,
    ) -> Result<i64, StoreError> {
        let anchor_bound = match at.checked_sub(confirmations) {
            Some(h) if h > 0 => h,
            _ => return Ok(0),
        };
        let anchor = match self.balance_at(address, HeightBound::AtMost(anchor_bound))? {
            Some(row) => row,
            None => return Ok(0),
        };
        let mut min = anchor.value.effective;
        for row in self.balance_history(address, anchor.height, at)? {
            min = min.min(row.value.effective);
        }
        Ok(min)
    }
}
