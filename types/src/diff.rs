//! Per-block state diff — the append coordinator's input.
//!
//! A `BlockDiff` is produced by transaction execution (out of scope for this
//! workspace) and describes every ledger row the enclosing block gives rise
//! to. Balances and asset balances arrive as point snapshots; lease balances,
//! asset quantities and order fills arrive as deltas against the prior latest
//! value.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::alias::Alias;
use crate::ids::{AssetId, LeaseId, OrderId};

/// A newly issued asset. Written once, immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssue {
    pub asset: AssetId,
    pub issuer: Address,
    pub name: String,
    pub description: String,
    pub decimals: u8,
    /// Initial quantity, seeding the cumulative quantity history.
    pub quantity: i64,
    pub reissuable: bool,
}

/// A reissue or burn of an existing asset: a signed quantity delta plus the
/// reissuable flag recorded on the new history row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuantityDelta {
    pub asset: AssetId,
    pub delta: i64,
    pub reissuable: bool,
}

/// An order fill: volume and fee deltas accumulated onto the order's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFillDelta {
    pub order: OrderId,
    pub volume_delta: i64,
    pub fee_delta: i64,
}

/// A newly created lease. Written once; its status history starts with an
/// active row at the creating height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseCreate {
    pub lease: LeaseId,
    pub sender: Address,
    pub recipient: Address,
    pub amount: i64,
}

/// Change to an address's lease in/out totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseDelta {
    pub address: Address,
    pub in_delta: i64,
    pub out_delta: i64,
}

/// Point snapshot of an address's regular and effective balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub address: Address,
    pub regular: i64,
    pub effective: i64,
}

/// Point snapshot of an address's balance in one asset. Must be non-negative
/// at write time; a negative snapshot aborts the whole append.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalanceSnapshot {
    pub address: Address,
    pub asset: AssetId,
    pub balance: i64,
}

/// A new alias bound to an address. Written once, immutable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasCreate {
    pub alias: Alias,
    pub address: Address,
}

/// Everything one block changes, grouped by entity family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDiff {
    pub issued_assets: Vec<AssetIssue>,
    pub asset_quantities: Vec<AssetQuantityDelta>,
    pub order_fills: Vec<OrderFillDelta>,
    pub new_leases: Vec<LeaseCreate>,
    pub cancelled_leases: Vec<LeaseId>,
    pub lease_deltas: Vec<LeaseDelta>,
    pub balances: Vec<BalanceSnapshot>,
    pub asset_balances: Vec<AssetBalanceSnapshot>,
    pub new_aliases: Vec<AliasCreate>,
}

impl BlockDiff {
    /// True when the diff carries no rows at all (an empty block).
    pub fn is_empty(&self) -> bool {
        self.issued_assets.is_empty()
            && self.asset_quantities.is_empty()
            && self.order_fills.is_empty()
            && self.new_leases.is_empty()
            && self.cancelled_leases.is_empty()
            && self.lease_deltas.is_empty()
            && self.balances.is_empty()
            && self.asset_balances.is_empty()
            && self.new_aliases.is_empty()
    }
}
