//! Order fill storage trait.

use serde::{Deserialize, Serialize};
use tidemark_types::OrderId;

use crate::{HeightBound, StoreError, Versioned};

/// Cumulative filled volume and paid fee for one order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledQuantityRecord {
    pub volume: i64,
    pub fee: i64,
}

/// Trait for order fill queries.
pub trait OrderFillStore {
    /// Latest cumulative fill row at or below the bound.
    fn filled_at(
        &self,
        order: &OrderId,
        bound: HeightBound,
    ) -> Result<Option<Versioned<FilledQuantityRecord>>, StoreError>;

    /// Current cumulative volume and fee, defaulting to (0, 0) for an order
    /// with no fill history.
    fn filled_volume_and_fee(&self, order: &OrderId) -> Result<FilledQuantityRecord, StoreError> {
        Ok(self
            .filled_at(order, HeightBound::Latest)?
            .map(|row| row.value)
            .unwrap_or_default())
    }
}
