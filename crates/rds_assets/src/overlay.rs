//! Pending modifications layered on top of the archives.
//!
//! The [`Overlay`] is the only mutable view of the asset graph. Every read goes
//! through [`classify`], which consults the overlay before the
//! [`ContainerIndex`], so an id always resolves to exactly one logical value:
//! the replacement, a tombstone, the archived original, or nothing.

use crate::index::{ArchiveRef, ContainerIndex};
use rds_common::{AssetId, RawResource};
use std::collections::{BTreeMap, BTreeSet};

/// A pending change to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Replaced(RawResource),
    /// Tombstone: the asset is logically gone.
    Deleted,
}

/// What a lookup of one id resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState<'a> {
    /// Unmodified, stored in these archives (never empty).
    Resident(&'a BTreeSet<ArchiveRef>),
    /// Replaced or newly created.
    Overridden(&'a RawResource),
    Deleted,
    Missing,
}

impl AssetState<'_> {
    pub fn exists(&self) -> bool {
        matches!(self, AssetState::Resident(_) | AssetState::Overridden(_))
    }
}

#[derive(Debug, Default)]
pub struct Overlay {
    modifications: BTreeMap<AssetId, Modification>,
    /// Per target archive, ids to copy into it at save time.
    ensured: BTreeMap<ArchiveRef, BTreeSet<AssetId>>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset_id: AssetId) -> Option<&Modification> {
        self.modifications.get(&asset_id)
    }

    pub fn replace(&mut self, asset_id: AssetId, resource: RawResource) {
        self.modifications
            .insert(asset_id, Modification::Replaced(resource));
    }

    /// Tombstone `asset_id` and drop it from every ensure-set.
    pub fn delete(&mut self, asset_id: AssetId) {
        self.modifications.insert(asset_id, Modification::Deleted);
        for ids in self.ensured.values_mut() {
            ids.remove(&asset_id);
        }
        self.ensured.retain(|_, ids| !ids.is_empty());
    }

    /// Record that `archive` must contain `asset_id` after saving.
    ///
    /// Returns `false` if it was already recorded.
    pub fn ensure(&mut self, archive: ArchiveRef, asset_id: AssetId) -> bool {
        self.ensured.entry(archive).or_default().insert(asset_id)
    }

    pub fn ensured_in(&self, archive: ArchiveRef) -> impl Iterator<Item = AssetId> + '_ {
        self.ensured
            .get(&archive)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Archives with a non-empty ensure-set.
    pub fn ensured_archives(&self) -> impl Iterator<Item = ArchiveRef> + '_ {
        self.ensured.keys().copied()
    }

    /// Whether `asset_id` is ensured into any archive.
    pub fn is_ensured(&self, asset_id: AssetId) -> bool {
        self.ensured.values().any(|ids| ids.contains(&asset_id))
    }

    pub fn modifications(&self) -> impl Iterator<Item = (AssetId, &Modification)> {
        self.modifications.iter().map(|(id, m)| (*id, m))
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty() && self.ensured.is_empty()
    }

    pub fn clear(&mut self) {
        self.modifications.clear();
        self.ensured.clear();
    }
}

/// Resolve `asset_id` against the overlay, then the index.
pub fn classify<'a>(
    overlay: &'a Overlay,
    index: &'a ContainerIndex,
    asset_id: AssetId,
) -> AssetState<'a> {
    match overlay.get(asset_id) {
        Some(Modification::Replaced(resource)) => AssetState::Overridden(resource),
        Some(Modification::Deleted) => AssetState::Deleted,
        None => match index.containers(asset_id) {
            Some(archives) if !archives.is_empty() => AssetState::Resident(archives),
            _ => AssetState::Missing,
        },
    }
}
