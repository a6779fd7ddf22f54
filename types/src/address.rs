//! Fixed-width account address.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeError;

/// A ledger account address: 26 raw bytes (version byte, chain byte,
/// public-key hash, checksum), produced and validated by the address codec
/// upstream of this workspace.
///
/// The store treats addresses as opaque fixed-width identifiers. A persisted
/// key that does not decode back into exactly [`Address::LENGTH`] bytes is a
/// database integrity error, not a user error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; Address::LENGTH]);

impl Address {
    /// Raw byte length of every address.
    pub const LENGTH: usize = 26;

    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse an address from raw bytes, rejecting any length other than
    /// [`Address::LENGTH`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; Self::LENGTH] = bytes
            .try_into()
            .map_err(|_| TypeError::InvalidAddressLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
