//! Per-game rules for asset ids.
//!
//! Each supported game has its own id space: the width of an id, the sentinel
//! that marks "no asset", and the hash used to turn an asset name into an id.

use crate::asset_id::AssetId;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A game whose data files can be managed.
///
/// Ordering follows release order, so `game <= Game::Echoes` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Game {
    Prime = 1,
    Echoes = 2,
    Corruption = 3,
    PrimeRemaster = 10,
}

/// On-disk width of an asset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdWidth {
    U32,
    U64,
    Guid,
}

impl IdWidth {
    /// Number of bytes an id of this width occupies in archive tables.
    pub const fn byte_len(self) -> usize {
        match self {
            IdWidth::U32 => 4,
            IdWidth::U64 => 8,
            IdWidth::Guid => 16,
        }
    }
}

/// `Textures/Misc/VisorSteamQtr.TXTR`, referenced everywhere but loaded globally.
const ECHOES_MLVL_IGNORED: &[u64] = &[0x7B2E_A5B1];

/// `audio_groups_single_player_DGRP`
const ECHOES_AUDIO_GROUP_DGRP: u64 = 0x31CB_5ADB;

impl Game {
    pub const ALL: [Game; 4] = [
        Game::Prime,
        Game::Echoes,
        Game::Corruption,
        Game::PrimeRemaster,
    ];

    pub fn id_width(self) -> IdWidth {
        match self {
            Game::Prime | Game::Echoes => IdWidth::U32,
            Game::Corruption => IdWidth::U64,
            Game::PrimeRemaster => IdWidth::Guid,
        }
    }

    /// The id every format uses to mean "no asset here".
    pub fn invalid_asset_id(self) -> AssetId {
        match self.id_width() {
            IdWidth::U32 => AssetId::Int(u64::from(u32::MAX)),
            IdWidth::U64 => AssetId::Int(u64::MAX),
            IdWidth::Guid => AssetId::Guid(Uuid::nil()),
        }
    }

    /// Whether `asset_id` can name an asset in this game.
    ///
    /// The all-ones sentinel is never valid. Prime also reserves zero. Ids of
    /// the wrong shape for this game (a GUID in Prime, an integer wider than
    /// 32 bits in Echoes) are rejected as well.
    pub fn is_valid_asset_id(self, asset_id: AssetId) -> bool {
        if asset_id == self.invalid_asset_id() {
            return false;
        }
        if self == Game::Prime && asset_id == AssetId::Int(0) {
            return false;
        }
        match (self.id_width(), asset_id) {
            (IdWidth::U32, AssetId::Int(value)) => value <= u64::from(u32::MAX),
            (IdWidth::U64, AssetId::Int(_)) => true,
            (IdWidth::Guid, AssetId::Guid(_)) => true,
            _ => false,
        }
    }

    /// Hash an asset name into this game's id space.
    ///
    /// Names are hashed case-insensitively. Returns `None` for games whose ids
    /// are GUIDs, which have no name hash.
    pub fn hash_asset_id(self, asset_name: &str) -> Option<AssetId> {
        let normalized = asset_name.to_lowercase();
        match self.id_width() {
            IdWidth::U32 => Some(AssetId::from(crc32fast::hash(normalized.as_bytes()))),
            IdWidth::U64 => Some(AssetId::from(xxhash_rust::xxh64::xxh64(
                normalized.as_bytes(),
                0,
            ))),
            IdWidth::Guid => None,
        }
    }

    /// Bring an id into this game's representation.
    ///
    /// Integer ids given for a GUID game are widened into a GUID; everything
    /// else is returned unchanged.
    pub fn normalize_asset_id(self, asset_id: AssetId) -> AssetId {
        match (self.id_width(), asset_id) {
            (IdWidth::Guid, AssetId::Int(value)) => AssetId::Guid(Uuid::from_u128(u128::from(value))),
            _ => asset_id,
        }
    }

    /// Ids that a level dependency walk never lists.
    pub fn mlvl_dependencies_to_ignore(self) -> Vec<AssetId> {
        match self {
            Game::Echoes => ECHOES_MLVL_IGNORED.iter().copied().map(AssetId::Int).collect(),
            _ => Vec::new(),
        }
    }

    /// The dependency group that already carries every default audio group.
    ///
    /// Level walks skip audio-group edges that this group already lists.
    pub fn audio_group_dependency_group(self) -> Option<AssetId> {
        match self {
            Game::Echoes => Some(AssetId::Int(ECHOES_AUDIO_GROUP_DGRP)),
            _ => None,
        }
    }

    /// Short name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Game::Prime => "prime",
            Game::Echoes => "echoes",
            Game::Corruption => "corruption",
            Game::PrimeRemaster => "prime-remaster",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prime" | "mp1" => Ok(Game::Prime),
            "echoes" | "mp2" => Ok(Game::Echoes),
            "corruption" | "mp3" => Ok(Game::Corruption),
            "prime-remaster" | "remaster" => Ok(Game::PrimeRemaster),
            _ => Err(ParseError::UnknownGame(s.to_string())),
        }
    }
}
