//! Identifier types for ledger and market entities
//!
//! Accounts and token contracts are addressed by opaque 20-byte identifiers
//! rendered as `0x`-prefixed hex. Orders use UUID v7 for time-sortable
//! ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ParseError;

/// Width of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// Opaque fixed-width account or contract address
///
/// Serialized as a lowercase `0x`-prefixed hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an address whose low 8 bytes hold `value` (big-endian).
    ///
    /// Handy for deterministic fixtures.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let bytes = hex::decode(digits).map_err(|e| ParseError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;

        let bytes: [u8; ADDRESS_LEN] =
            bytes.try_into().map_err(|raw: Vec<u8>| ParseError::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected {} bytes, got {}", ADDRESS_LEN, raw.len()),
            })?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Identifier of a listed security token: the token contract's address
pub type TokenId = Address;

/// Unique identifier for an order
///
/// Uses UUID v7 for time-based sorting. Orders can be efficiently
/// queried in chronological order using the embedded timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new OrderId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr: Address = "0x6b15841452B63FEF248837dbF3012BEB5a0C97A5".parse().unwrap();
        assert_eq!(addr.to_string(), "0x6b15841452b63fef248837dbf3012beb5a0c97a5");
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_without_prefix() {
        let addr: Address = "a4703e892c41d6b85cbf16cdf80d5dd5e22b45d1".parse().unwrap();
        assert!(!addr.is_zero());
    }

    #[test]
    fn test_address_wrong_length() {
        let result = "0x1234".parse::<Address>();
        assert!(matches!(result, Err(ParseError::InvalidAddress { .. })));
    }

    #[test]
    fn test_address_bad_hex() {
        let result = "0xzz15841452b63fef248837dbf3012beb5a0c97a5".parse::<Address>();
        assert!(matches!(result, Err(ParseError::InvalidAddress { .. })));
    }

    #[test]
    fn test_address_from_low_u64() {
        let addr = Address::from_low_u64(0x2a);
        assert_eq!(addr.to_string(), "0x000000000000000000000000000000000000002a");
        assert_ne!(Address::from_low_u64(1), Address::from_low_u64(2));
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_serialization() {
        let addr = Address::from_low_u64(7);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000007\"");

        let deserialized: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, deserialized);
    }

    #[test]
    fn test_address_deserialize_invalid() {
        let result: Result<Address, _> = serde_json::from_str("\"0xabc\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_order_id_creation() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
