use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a single asset.
///
/// Prime, Echoes and Corruption use plain integers (32 or 64 bits wide), the
/// remaster uses GUIDs. The id is opaque beyond equality, ordering and hashing;
/// whether a given value is a valid id is decided by [`Game::is_valid_asset_id`](crate::Game::is_valid_asset_id).
///
/// Serialized untagged: integers as JSON numbers, GUIDs as hyphenated strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Int(u64),
    Guid(Uuid),
}

impl AssetId {
    /// The integer value, if this is not a GUID.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AssetId::Int(value) => Some(*value),
            AssetId::Guid(_) => None,
        }
    }

    pub fn is_guid(&self) -> bool {
        matches!(self, AssetId::Guid(_))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Int(value) if *value <= u64::from(u32::MAX) => write!(f, "0x{:08X}", value),
            AssetId::Int(value) => write!(f, "0x{:016X}", value),
            AssetId::Guid(guid) => write!(f, "{}", guid),
        }
    }
}

impl From<u32> for AssetId {
    fn from(value: u32) -> Self {
        AssetId::Int(u64::from(value))
    }
}

impl From<u64> for AssetId {
    fn from(value: u64) -> Self {
        AssetId::Int(value)
    }
}

impl From<Uuid> for AssetId {
    fn from(value: Uuid) -> Self {
        AssetId::Guid(value)
    }
}

/// Parses `0x`-prefixed hex, plain decimal, or a hyphenated GUID.
impl FromStr for AssetId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u64::from_str_radix(hex, 16)
                .map(AssetId::Int)
                .map_err(|_| ParseError::InvalidAssetId(s.to_string()));
        }
        if let Ok(value) = trimmed.parse::<u64>() {
            return Ok(AssetId::Int(value));
        }
        Uuid::parse_str(trimmed)
            .map(AssetId::Guid)
            .map_err(|_| ParseError::InvalidAssetId(s.to_string()))
    }
}

/// How a caller addresses an asset: by its id, or by a human readable name.
///
/// Names are resolved by the asset manager (custom name table first, then the
/// game's name hash). The original key is kept around so that lookup failures
/// can report what the caller actually asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKey {
    Name(String),
    Id(AssetId),
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKey::Name(name) => f.write_str(name),
            AssetKey::Id(id) => id.fmt(f),
        }
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        AssetKey::Name(value.to_string())
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        AssetKey::Name(value)
    }
}

impl From<&String> for AssetKey {
    fn from(value: &String) -> Self {
        AssetKey::Name(value.clone())
    }
}

impl From<AssetId> for AssetKey {
    fn from(value: AssetId) -> Self {
        AssetKey::Id(value)
    }
}

impl From<&AssetId> for AssetKey {
    fn from(value: &AssetId) -> Self {
        AssetKey::Id(*value)
    }
}

impl From<u32> for AssetKey {
    fn from(value: u32) -> Self {
        AssetKey::Id(value.into())
    }
}

impl From<u64> for AssetKey {
    fn from(value: u64) -> Self {
        AssetKey::Id(value.into())
    }
}

impl From<Uuid> for AssetKey {
    fn from(value: Uuid) -> Self {
        AssetKey::Id(value.into())
    }
}
