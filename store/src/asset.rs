//! Asset storage trait: immutable issuance facts plus the cumulative
//! quantity history.

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, AssetId, Height};

use crate::{HeightBound, StoreError, Versioned};

/// Immutable facts recorded once when an asset is issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfoRecord {
    pub issuer: Address,
    pub name: String,
    pub description: String,
    pub decimals: u8,
    pub issue_height: Height,
}

/// One row of an asset's quantity history. `quantity` is cumulative (the
/// running total after applying the row's delta); `reissuable` is recorded
/// per row, so the latest row carries the asset's current reissuability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuantityRecord {
    pub quantity: i64,
    pub reissuable: bool,
}

/// Trait for asset queries.
pub trait AssetStore {
    /// Issuance facts, or `None` for an unknown asset.
    fn asset_info(&self, asset: &AssetId) -> Result<Option<AssetInfoRecord>, StoreError>;

    /// Latest quantity row at or below the bound.
    fn quantity_at(
        &self,
        asset: &AssetId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<AssetQuantityRecord>>, StoreError>;
}
