//! Transaction representation consumed by the secondary indexer.
//!
//! The indexer decodes a block's raw body into a list of these records and
//! bulk-loads the generic and type-specific index tables from them. Only
//! transfers and exchanges carry detail payloads; every other type is indexed
//! generically by id, signature, type tag and touched addresses.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::ids::{AssetId, OrderId, Signature, TxId};

/// Numeric transaction type tags, stable across the wire and the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TxType {
    Genesis = 1,
    Payment = 2,
    Issue = 3,
    Transfer = 4,
    Reissue = 5,
    Burn = 6,
    Exchange = 7,
    Lease = 8,
    LeaseCancel = 9,
    CreateAlias = 10,
}

/// Detail payload for a transfer: who sent what to whom, in which asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    pub sender: Address,
    pub recipient: Address,
    /// `None` means the chain's native token.
    pub asset: Option<AssetId>,
    pub amount: i64,
    pub fee: i64,
}

/// Detail payload for an exchange: the traded pair plus executed amount and
/// price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeData {
    pub amount_asset: Option<AssetId>,
    pub price_asset: Option<AssetId>,
    pub amount: i64,
    pub price: i64,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
}

/// Type-specific payload carried alongside the generic record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxData {
    Transfer(TransferData),
    Exchange(ExchangeData),
}

/// One transaction as it appears in a block body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub signature: Signature,
    pub tx_type: TxType,
    /// Every address this transaction touches (sender, recipients,
    /// counterparties). Drives the per-address secondary index.
    pub addresses: Vec<Address>,
    pub data: Option<TxData>,
}

impl Transaction {
    /// All touched addresses, including any carried inside the detail
    /// payload, deduplicated and in first-seen order.
    pub fn touched_addresses(&self) -> Vec<Address> {
        fn push_unique(out: &mut Vec<Address>, addr: Address) {
            if !out.contains(&addr) {
                out.push(addr);
            }
        }

        let mut out: Vec<Address> = Vec::with_capacity(self.addresses.len() + 2);
        for addr in &self.addresses {
            push_unique(&mut out, *addr);
        }
        if let Some(TxData::Transfer(t)) = &self.data {
            push_unique(&mut out, t.sender);
            push_unique(&mut out, t.recipient);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(seed: u8) -> Address {
        Address::new([seed; Address::LENGTH])
    }

    #[test]
    fn touched_addresses_deduplicates() {
        let tx = Transaction {
            id: TxId::new([1; 32]),
            signature: Signature::ZERO,
            tx_type: TxType::Transfer,
            addresses: vec![addr(1), addr(2)],
            data: Some(TxData::Transfer(TransferData {
                sender: addr(1),
                recipient: addr(3),
                asset: None,
                amount: 10,
                fee: 1,
            })),
        };
        assert_eq!(tx.touched_addresses(), vec![addr(1), addr(2), addr(3)]);
    }
}
