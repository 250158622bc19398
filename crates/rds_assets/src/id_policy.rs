//! Stock id generators for [`AssetConverter`](crate::AssetConverter).
//!
//! A generator is any `FnMut(&AssetDetails) -> AssetId`. It is called once per
//! converted asset, before the asset's conversion function runs.

use crate::converter::AssetDetails;
use rds_common::{AssetId, Game, IdWidth};
use uuid::Uuid;
use xxhash_rust::xxh64::xxh64;

/// Hand out `start`, `start + 1`, ... in conversion order.
///
/// Integer and GUID starting points both work; GUIDs count as 128-bit integers.
pub fn sequential(start: impl Into<AssetId>) -> impl FnMut(&AssetDetails) -> AssetId {
    let mut next = start.into();
    move |_: &AssetDetails| {
        let id = next;
        next = match next {
            AssetId::Int(value) => AssetId::Int(value.wrapping_add(1)),
            AssetId::Guid(value) => AssetId::Guid(Uuid::from_u128(value.as_u128().wrapping_add(1))),
        };
        id
    }
}

/// Derive the new id from the source game, id and type.
///
/// The same source asset always maps to the same id, so separate conversion
/// jobs agree with each other. Results never collide with the target game's
/// invalid sentinel.
pub fn hashed(target_game: Game) -> impl FnMut(&AssetDetails) -> AssetId {
    move |details: &AssetDetails| {
        let seed = seed_bytes(details);
        match target_game.id_width() {
            IdWidth::U32 => {
                let mut value = xxh64(&seed, 0) as u32;
                if value == 0 || value == u32::MAX {
                    value = value.wrapping_add(2);
                }
                AssetId::from(value)
            }
            IdWidth::U64 => {
                let value = xxh64(&seed, 0);
                AssetId::Int(if value == u64::MAX { 0 } else { value })
            }
            IdWidth::Guid => {
                let high = u128::from(xxh64(&seed, 0));
                let low = u128::from(xxh64(&seed, 1));
                AssetId::Guid(Uuid::from_u128((high << 64) | low.max(1)))
            }
        }
    }
}

/// Keep every asset's source id.
///
/// Only meaningful between games that share an id space.
pub fn identity() -> impl FnMut(&AssetDetails) -> AssetId {
    |details: &AssetDetails| details.asset_id
}

fn seed_bytes(details: &AssetDetails) -> Vec<u8> {
    let mut seed = Vec::with_capacity(32);
    seed.extend_from_slice(details.original_game.as_str().as_bytes());
    match details.asset_id {
        AssetId::Int(value) => seed.extend_from_slice(&value.to_be_bytes()),
        AssetId::Guid(value) => seed.extend_from_slice(value.as_bytes()),
    }
    seed.extend_from_slice(details.asset_type.as_bytes());
    seed
}
