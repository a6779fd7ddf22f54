//! Alias storage trait.

use serde::{Deserialize, Serialize};
use tidemark_types::{Address, Alias, Height};

use crate::StoreError;

/// An alias binding, written once at creation and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub address: Address,
    pub height: Height,
}

/// Trait for alias lookups in both directions.
pub trait AliasStore {
    /// The address an alias points at, or `None` if the alias was never
    /// created.
    fn resolve(&self, alias: &Alias) -> Result<Option<Address>, StoreError>;

    /// Every alias bound to the address, in lexicographic order.
    fn aliases_of(&self, address: &Address) -> Result<Vec<Alias>, StoreError>;
}
