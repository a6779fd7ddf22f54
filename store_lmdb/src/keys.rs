//! Composite key construction and parsing.
//!
//! History rows are keyed `natural_key ++ height_be_u64`. All natural key
//! components are fixed-width (addresses 26 bytes, ids 32 bytes), so a range
//! scan bounded by `key ++ 0` and `key ++ h` only ever visits rows of that
//! key, and a big-endian height suffix sorts the rows chronologically.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn};

use tidemark_store::{HeightBound, StoreError};
use tidemark_types::{Address, Height, TxId};

use crate::LmdbError;

pub(crate) const HEIGHT_LEN: usize = 8;

/// Key of a block row: the bare big-endian height.
pub(crate) fn height_key(height: Height) -> [u8; HEIGHT_LEN] {
    height.to_be_bytes()
}

/// `addr(26) ++ height(8)` — balances and lease balances.
pub(crate) fn addr_height_key(address: &Address, height: Height) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LENGTH + HEIGHT_LEN);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// `addr(26) ++ asset(32) ++ height(8)` — per-asset balances.
pub(crate) fn addr_asset_height_key(address: &Address, asset: &[u8; 32], height: Height) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LENGTH + 32 + HEIGHT_LEN);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(asset);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// `id(32) ++ height(8)` — asset quantities, lease statuses, order fills.
pub(crate) fn id_height_key(id: &[u8; 32], height: Height) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(id);
    key[32..].copy_from_slice(&height.to_be_bytes());
    key
}

/// `addr(26) ++ alias` — the reverse alias index.
pub(crate) fn addr_alias_key(address: &Address, alias: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LENGTH + alias.len());
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(alias.as_bytes());
    key
}

/// `addr(26) ++ height(8) ++ tx_id(32)` — the per-address transaction index,
/// chronological within one address.
pub(crate) fn addr_height_tx_key(address: &Address, height: Height, tx_id: &TxId) -> Vec<u8> {
    let mut key = Vec::with_capacity(Address::LENGTH + HEIGHT_LEN + 32);
    key.extend_from_slice(address.as_bytes());
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(tx_id.as_bytes());
    key
}

/// Parse the big-endian height stored in the last 8 bytes of a composite key.
pub(crate) fn height_suffix(key: &[u8]) -> Result<Height, StoreError> {
    let offset = key.len().checked_sub(HEIGHT_LEN).ok_or_else(|| {
        StoreError::Corruption(format!("composite key too short: {} bytes", key.len()))
    })?;
    height_at(key, offset)
}

/// Parse a big-endian height at a fixed offset inside a composite key.
pub(crate) fn height_at(key: &[u8], offset: usize) -> Result<Height, StoreError> {
    key.get(offset..offset + HEIGHT_LEN)
        .and_then(|bytes| bytes.try_into().ok())
        .map(Height::from_be_bytes)
        .ok_or_else(|| StoreError::Corruption(format!("composite key too short: {} bytes", key.len())))
}

/// Exclusive upper bound for a prefix scan: the prefix's lexicographic
/// successor. `None` means the prefix is all 0xFF and the scan must run to
/// the end of the database.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}

/// Range bounds covering every key that starts with `prefix`. The caller
/// keeps the `prefix_upper_bound` result alive for the scan's duration.
pub(crate) fn prefix_bounds<'a>(
    prefix: &'a [u8],
    upper: &'a Option<Vec<u8>>,
) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    (
        Bound::Included(prefix),
        match upper.as_deref() {
            Some(u) => Bound::Excluded(u),
            None => Bound::Unbounded,
        },
    )
}

/// Resolve a height bound to a concrete scan limit. `Latest` maps to
/// `u64::MAX`: no row above the committed chain head exists, so the open
/// bound reads the same row the exact current height would.
pub(crate) fn scan_limit(bound: HeightBound) -> Height {
    match bound {
        HeightBound::Latest => Height::MAX,
        HeightBound::AtMost(h) => h,
    }
}

/// The row with the greatest height `<= max_height` for a fixed-width key
/// prefix: one reverse range scan, first hit wins. Returns the row's height
/// and an owned copy of its value.
pub(crate) fn latest_le(
    db: &Database<Bytes, Bytes>,
    rtxn: &RoTxn,
    prefix: &[u8],
    max_height: Height,
) -> Result<Option<(Height, Vec<u8>)>, StoreError> {
    let mut lo = Vec::with_capacity(prefix.len() + HEIGHT_LEN);
    lo.extend_from_slice(prefix);
    lo.extend_from_slice(&0u64.to_be_bytes());
    let mut hi = Vec::with_capacity(prefix.len() + HEIGHT_LEN);
    hi.extend_from_slice(prefix);
    hi.extend_from_slice(&max_height.to_be_bytes());

    let bounds = (Bound::Included(lo.as_slice()), Bound::Included(hi.as_slice()));
    let mut iter = db.rev_range(rtxn, &bounds).map_err(LmdbError::from)?;
    match iter.next() {
        Some(entry) => {
            let (key, value) = entry.map_err(LmdbError::from)?;
            let height = height_suffix(key)?;
            Ok(Some((height, value.to_vec())))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_suffix_roundtrip() {
        let addr = Address::new([3u8; Address::LENGTH]);
        let key = addr_height_key(&addr, 42);
        assert_eq!(height_suffix(&key).expect("parse"), 42);
    }

    #[test]
    fn prefix_upper_bound_carries_past_trailing_ff() {
        assert_eq!(prefix_upper_bound(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_upper_bound(&[0x01, 0x02]), Some(vec![0x01, 0x03]));
        assert_eq!(prefix_upper_bound(&[0xFF, 0xFF]), None);
    }

    #[test]
    fn big_endian_heights_sort_lexicographically() {
        let addr = Address::new([9u8; Address::LENGTH]);
        let k1 = addr_height_key(&addr, 9);
        let k2 = addr_height_key(&addr, 10);
        let k3 = addr_height_key(&addr, 256);
        assert!(k1 < k2 && k2 < k3);
    }
}
