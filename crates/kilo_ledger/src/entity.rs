use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A Hedera entity id in `shard.realm.num` form.
///
/// Accounts, contracts and tokens share the same numbering scheme, so one type
/// covers all three; the aliases below only document intent at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

pub type AccountId = EntityId;
pub type ContractId = EntityId;
pub type TokenId = EntityId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityIdError {
    #[error("expected shard.realm.num, got {0:?}")]
    Malformed(String),

    #[error("invalid solidity address {0:?}")]
    InvalidAddress(String),

    #[error("{0} is an EVM alias, not a long-zero entity address")]
    NotLongZero(String),

    #[error("shard {0} does not fit in a solidity address")]
    ShardOverflow(u64),
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Long-zero EVM address: 4 bytes shard, 8 bytes realm, 8 bytes num.
    pub fn to_solidity_address(&self) -> Result<Address, EntityIdError> {
        let shard = u32::try_from(self.shard).map_err(|_| EntityIdError::ShardOverflow(self.shard))?;
        let mut bytes = [0u8; 20];
        bytes[..4].copy_from_slice(&shard.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
        bytes[12..].copy_from_slice(&self.num.to_be_bytes());
        Ok(Address::from(bytes))
    }

    /// Lowercase hex of [`Self::to_solidity_address`] without the `0x` prefix.
    pub fn to_solidity_hex(&self) -> Result<String, EntityIdError> {
        Ok(hex::encode(self.to_solidity_address()?))
    }

    /// Parse a long-zero solidity address, with or without `0x`.
    pub fn from_solidity_address(address: &str) -> Result<Self, EntityIdError> {
        let trimmed = address.trim();
        let parsed = Address::from_str(trimmed)
            .map_err(|_| EntityIdError::InvalidAddress(trimmed.to_string()))?;
        Self::from_address(parsed)
    }

    /// Convert a long-zero [`Address`] back to an entity id.
    pub fn from_address(address: Address) -> Result<Self, EntityIdError> {
        let bytes = address.as_slice();
        // Long-zero addresses keep realm well below 2^32 in practice; a set high
        // realm byte means the address is a key-derived alias.
        if bytes[4..8] != [0, 0, 0, 0] {
            return Err(EntityIdError::NotLongZero(format!("{address:#x}")));
        }
        let mut shard = [0u8; 4];
        let mut realm = [0u8; 8];
        let mut num = [0u8; 8];
        shard.copy_from_slice(&bytes[..4]);
        realm.copy_from_slice(&bytes[4..12]);
        num.copy_from_slice(&bytes[12..]);
        Ok(Self::new(
            u64::from(u32::from_be_bytes(shard)),
            u64::from_be_bytes(realm),
            u64::from_be_bytes(num),
        ))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        let [shard, realm, num] = parts.as_slice() else {
            return Err(EntityIdError::Malformed(trimmed.to_string()));
        };
        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| EntityIdError::Malformed(trimmed.to_string()))
        };
        Ok(Self::new(parse(shard)?, parse(realm)?, parse(num)?))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
