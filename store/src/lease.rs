//! Lease storage trait.
//!
//! A lease has two persisted aspects: the immutable creation facts, and an
//! append-only log of status toggles. A lease counts as active only while
//! *every* row in its status log says active — one cancellation row retires
//! it permanently, with no reactivation path.

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, Height, LeaseId};

use crate::StoreError;

/// Immutable facts recorded once when a lease is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseInfoRecord {
    pub sender: Address,
    pub recipient: Address,
    pub amount: i64,
    pub height: Height,
}

/// Trait for lease queries.
pub trait LeaseStore {
    /// Creation facts, or `None` for an unknown lease.
    fn lease_info(&self, lease: &LeaseId) -> Result<Option<LeaseInfoRecord>, StoreError>;

    /// Whether every status row for the lease is active. Unknown leases (no
    /// rows at all) are not active.
    fn is_active(&self, lease: &LeaseId) -> Result<bool, StoreError>;

    /// Distinct ids of every lease whose full status history is all-active.
    fn active_leases(&self) -> Result<Vec<LeaseId>, StoreError>;
}
