//! Opaque 32-byte entity identifiers and the 64-byte signature type.
//!
//! Block, transaction, asset, lease and order ids are cryptographic digests
//! computed by layers above this workspace; here they are fixed-width keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::TypeError;

/// A 32-byte block id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId([u8; 32]);

/// A 32-byte transaction id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId([u8; 32]);

/// A 32-byte asset id (the id of the issue transaction).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId([u8; 32]);

/// A 32-byte lease id (the id of the lease transaction).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaseId([u8; 32]);

/// A 32-byte order id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId([u8; 32]);

macro_rules! impl_id32 {
    ($name:ident) => {
        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Parse an id from raw bytes, rejecting any length other than 32.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
                let arr: [u8; 32] = bytes.try_into().map_err(|_| TypeError::InvalidIdLength {
                    expected: 32,
                    got: bytes.len(),
                })?;
                Ok(Self(arr))
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
    };
}

impl_id32!(BlockId);
impl_id32!(TxId);
impl_id32!(AssetId);
impl_id32!(LeaseId);
impl_id32!(OrderId);

/// A 64-byte transaction signature.
///
/// Serde is hand-written because derived impls only cover arrays up to 32
/// elements.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub const ZERO: Self = Self([0u8; 64]);

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SigVisitor;

        impl<'de> serde::de::Visitor<'de> for SigVisitor {
            type Value = Signature;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "64 bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let arr: [u8; 64] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(Signature(arr))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut arr = [0u8; 64];
                for (i, byte) in arr.iter_mut().enumerate() {
                    *byte = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(Signature(arr))
            }
        }

        deserializer.deserialize_bytes(SigVisitor)
    }
}

// Inline hex encoding to avoid adding the `hex` crate as a dependency of types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip_through_bytes() {
        let id = AssetId::new([0xAB; 32]);
        let parsed = AssetId::from_bytes(id.as_bytes()).expect("roundtrip");
        assert_eq!(parsed, id);
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        assert!(matches!(
            TxId::from_bytes(&[1u8; 31]),
            Err(TypeError::InvalidIdLength { expected: 32, got: 31 })
        ));
    }

    #[test]
    fn signature_bincode_roundtrip() {
        let mut raw = [0u8; 64];
        raw[0] = 0xFF;
        raw[63] = 0x01;
        let sig = Signature(raw);
        let bytes = bincode::serialize(&sig).expect("serialize");
        let back: Signature = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(back, sig);
    }
}
