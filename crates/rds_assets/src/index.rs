//! Asset id to archive lookup.
//!
//! The [`ContainerIndex`] is built by reading only the table of contents of
//! every archive, once when the [`AssetManager`](crate::AssetManager) starts and
//! again after every save. It answers two questions:
//!
//! 1. Which archives contain a given asset id ([`containers`](ContainerIndex::containers)).
//! 2. Which type the archive headers declare for it ([`asset_type`](ContainerIndex::asset_type)).
//!
//! Archive names are interned into [`ArchiveRef`]s in enumeration order, so the
//! smallest reference in a container set is always the first archive listed.

use rds_common::{AssetId, AssetType};
use rds_pak::PakToc;
use std::collections::{BTreeSet, HashMap};

/// Interned reference to an archive name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveRef(usize);

#[derive(Debug, Default)]
pub struct ContainerIndex {
    archives: Vec<String>,
    by_name: HashMap<String, ArchiveRef>,
    containers: HashMap<AssetId, BTreeSet<ArchiveRef>>,
    types: HashMap<AssetId, AssetType>,
}

impl ContainerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an archive name, returning the existing reference if already known.
    pub fn intern_archive(&mut self, name: &str) -> ArchiveRef {
        if let Some(archive) = self.by_name.get(name) {
            return *archive;
        }
        let archive = ArchiveRef(self.archives.len());
        self.archives.push(name.to_string());
        self.by_name.insert(name.to_string(), archive);
        archive
    }

    /// Record every entry of an archive's table of contents.
    pub fn add_archive(&mut self, name: &str, toc: &PakToc) -> ArchiveRef {
        let archive = self.intern_archive(name);
        for entry in &toc.entries {
            self.add_entry(entry.asset_id, entry.asset_type, archive);
        }
        archive
    }

    pub fn add_entry(&mut self, asset_id: AssetId, asset_type: AssetType, archive: ArchiveRef) {
        self.containers.entry(asset_id).or_default().insert(archive);
        self.types.insert(asset_id, asset_type);
    }

    /// Make `asset_id` known without placing it in any archive.
    ///
    /// Used for newly created assets until a save writes them somewhere.
    pub fn add_unplaced(&mut self, asset_id: AssetId, asset_type: AssetType) {
        self.containers.entry(asset_id).or_default();
        self.types.insert(asset_id, asset_type);
    }

    pub fn archive(&self, name: &str) -> Option<ArchiveRef> {
        self.by_name.get(name).copied()
    }

    pub fn archive_name(&self, archive: ArchiveRef) -> &str {
        &self.archives[archive.0]
    }

    /// All archives in enumeration order.
    pub fn archives(&self) -> impl Iterator<Item = (ArchiveRef, &str)> {
        self.archives
            .iter()
            .enumerate()
            .map(|(i, name)| (ArchiveRef(i), name.as_str()))
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Archives that contain `asset_id`, or `None` if the id was never seen.
    pub fn containers(&self, asset_id: AssetId) -> Option<&BTreeSet<ArchiveRef>> {
        self.containers.get(&asset_id)
    }

    /// Whether `archive` natively contains `asset_id`.
    pub fn is_in(&self, asset_id: AssetId, archive: ArchiveRef) -> bool {
        self.containers
            .get(&asset_id)
            .is_some_and(|set| set.contains(&archive))
    }

    pub fn asset_type(&self, asset_id: AssetId) -> Option<AssetType> {
        self.types.get(&asset_id).copied()
    }

    pub fn asset_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.containers.keys().copied()
    }

    pub fn asset_count(&self) -> usize {
        self.containers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut index = ContainerIndex::new();
        let a = index.intern_archive("a.pak");
        let b = index.intern_archive("b.pak");

        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(index.intern_archive("a.pak"), a);
        assert_eq!(index.archive_name(b), "b.pak");
        assert_eq!(index.archive("missing.pak"), None);
    }

    #[test]
    fn test_containers_keep_enumeration_order() {
        let mut index = ContainerIndex::new();
        let first = index.intern_archive("first.pak");
        let second = index.intern_archive("second.pak");
        let id = AssetId::from(0x1234u32);

        index.add_entry(id, AssetType::TXTR, second);
        index.add_entry(id, AssetType::TXTR, first);

        let containers = index.containers(id).unwrap();
        assert_eq!(containers.iter().next(), Some(&first));
        assert!(index.is_in(id, second));
        assert_eq!(index.asset_type(id), Some(AssetType::TXTR));
    }

    #[test]
    fn test_unplaced_asset() {
        let mut index = ContainerIndex::new();
        let id = AssetId::from(0xFFFF0000u32);
        index.add_unplaced(id, AssetType::STRG);

        assert!(index.containers(id).unwrap().is_empty());
        assert_eq!(index.asset_count(), 1);
    }
}
