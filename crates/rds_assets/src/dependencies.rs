//! Dependency resolution.
//!
//! [`AssetManager::dependencies_for`] enumerates the direct references of one
//! asset. The first item is always the asset itself; the remaining edges are
//! only computed once the caller asks for them. Edges come from, in order of
//! preference:
//!
//! 1. a dependency cheat registered for the type, which reads the raw bytes;
//! 2. nothing, if the format declares it never has dependencies;
//! 3. the decoded resource's own [`Resource::dependencies_for`].
//!
//! Discovery never fails. A missing asset yields nothing and an asset that
//! can't be decoded yields only itself, with a warning in the log.
//!
//! Level walks (`is_level_walk`) build the dependency manifest of a world. They
//! drop edges flagged `exclude_for_mlvl`, ids the game always ignores, and
//! audio banks already carried by the game's default audio dependency group.

use crate::format::{read_asset_id, Agsc, Atbl, Dgrp, Resource, NO_AUDIO_GROUP};
use crate::manager::AssetManager;
use rds_common::{AssetId, AssetKey, AssetType, Dependency, RawResource};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Lazily yields an asset followed by its direct dependencies.
pub struct Dependencies<'a> {
    manager: &'a AssetManager,
    is_level_walk: bool,
    stage: Stage,
}

enum Stage {
    Head(Dependency),
    Pending(Dependency),
    Edges(std::vec::IntoIter<Dependency>),
    Done,
}

impl Iterator for Dependencies<'_> {
    type Item = Dependency;

    fn next(&mut self) -> Option<Dependency> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Head(head) => {
                self.stage = Stage::Pending(head);
                Some(head)
            }
            Stage::Pending(head) => {
                let mut edges = self.manager.direct_edges(head, self.is_level_walk).into_iter();
                let next = edges.next();
                self.stage = Stage::Edges(edges);
                next
            }
            Stage::Edges(mut edges) => {
                let next = edges.next();
                if next.is_some() {
                    self.stage = Stage::Edges(edges);
                }
                next
            }
            Stage::Done => None,
        }
    }
}

impl AssetManager {
    /// The asset itself, then everything it directly references.
    ///
    /// Invalid and missing ids yield nothing. A warning is logged for missing
    /// ids unless `missing_ok` is set.
    pub fn dependencies_for(
        &self,
        key: impl Into<AssetKey>,
        is_level_walk: bool,
        missing_ok: bool,
    ) -> Dependencies<'_> {
        let key = key.into();
        let stage = match self.resolve(&key) {
            Err(e) => {
                tracing::warn!("Can't resolve {}: {}", key, e);
                Stage::Done
            }
            Ok(id) if !self.game().is_valid_asset_id(id) => Stage::Done,
            Ok(id) => match self.asset_type(id) {
                Ok(asset_type) => Stage::Head(Dependency::new(asset_type, id)),
                Err(_) => {
                    if !missing_ok {
                        tracing::warn!("Can't resolve asset id {}", id);
                    }
                    Stage::Done
                }
            },
        };

        Dependencies {
            manager: self,
            is_level_walk,
            stage,
        }
    }

    /// Every existing asset reachable from `roots`, each listed once, roots included.
    ///
    /// Listed in discovery order (depth first).
    pub fn dependency_closure<K: Into<AssetKey>>(
        &self,
        roots: impl IntoIterator<Item = K>,
        is_level_walk: bool,
    ) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        let mut stack: Vec<AssetKey> = roots.into_iter().map(Into::into).collect();
        stack.reverse();

        while let Some(key) = stack.pop() {
            let mut dependencies = self.dependencies_for(key, is_level_walk, false);
            let Some(head) = dependencies.next() else {
                continue;
            };
            if !seen.insert(head.id) {
                continue;
            }
            result.push(head);

            let children: Vec<AssetKey> = dependencies
                .filter(|edge| !seen.contains(&edge.id))
                .map(|edge| AssetKey::Id(edge.id))
                .collect();
            stack.extend(children.into_iter().rev());
        }
        result
    }

    /// The audio bank that provides `sound_id`, as a dependency.
    ///
    /// In a level walk, banks listed in the game's default audio dependency
    /// group are skipped.
    pub fn audio_group_dependency(&self, sound_id: u32, is_level_walk: bool) -> Option<Dependency> {
        let bank = self.audio_groups().bank_for(sound_id)?;

        if is_level_walk {
            if let Some(group) = self.game().audio_group_dependency_group() {
                if let Ok(dgrp) = self.decoded::<Dgrp>(group) {
                    if dgrp.contains(AssetType::AGSC, bank) {
                        return None;
                    }
                }
            }
        }

        Some(Dependency::new(AssetType::AGSC, bank))
    }

    fn direct_edges(&self, head: Dependency, is_level_walk: bool) -> Vec<Dependency> {
        let Dependency {
            asset_type, id, ..
        } = head;

        let edges = if let Some(cheat) = self.registry().cheat(asset_type) {
            match self.raw_asset(id) {
                Ok(raw) => cheat(&raw, self, is_level_walk),
                Err(e) => {
                    tracing::warn!("Can't read {} {} for dependency scan: {}", asset_type, id, e);
                    Vec::new()
                }
            }
        } else {
            match self.registry().format(asset_type) {
                None => {
                    tracing::debug!("No format for {}, assuming {} has no dependencies", asset_type, id);
                    return Vec::new();
                }
                Some(format) if !format.has_dependencies(self.game()) => return Vec::new(),
                Some(_) => match self
                    .decoded_asset(id, None)
                    .and_then(|resource: Box<dyn Resource>| resource.dependencies_for(self, is_level_walk))
                {
                    Ok(edges) => edges,
                    Err(e) => {
                        tracing::warn!("May be missing dependencies for {} {}: {}", asset_type, id, e);
                        Vec::new()
                    }
                },
            }
        };

        if !is_level_walk {
            return edges;
        }

        let ignored = self.game().mlvl_dependencies_to_ignore();
        edges
            .into_iter()
            .filter(|edge| !edge.exclude_for_mlvl && !ignored.contains(&edge.id))
            .collect()
    }
}

/// Sound id to audio bank lookup, built once from the game's `ATBL` and `AGSC` assets.
#[derive(Debug, Clone, Default)]
pub struct AudioGroupTable {
    banks: HashMap<u32, AssetId>,
}

impl AudioGroupTable {
    pub(crate) fn build(manager: &AssetManager) -> Self {
        let mut tables = Vec::new();
        let mut banks = Vec::new();
        for asset_id in manager.all_asset_ids() {
            match manager.asset_type(asset_id) {
                Ok(AssetType::ATBL) => tables.push(asset_id),
                Ok(AssetType::AGSC) => banks.push(asset_id),
                _ => {}
            }
        }

        let Some(table_id) = tables.first().copied() else {
            return Self::default();
        };
        if tables.len() > 1 {
            tracing::warn!("Found {} ATBL assets, using {}", tables.len(), table_id);
        }

        let atbl = match manager.decoded::<Atbl>(table_id) {
            Ok(atbl) => atbl,
            Err(e) => {
                tracing::warn!("Can't decode audio group table {}: {}", table_id, e);
                return Self::default();
            }
        };

        let mut define_to_bank: HashMap<u16, Option<AssetId>> = HashMap::new();
        define_to_bank.insert(NO_AUDIO_GROUP, None);
        for bank_id in banks {
            match manager.decoded::<Agsc>(bank_id) {
                Ok(agsc) => {
                    for define_id in agsc.define_ids {
                        define_to_bank.insert(define_id, Some(bank_id));
                    }
                }
                Err(e) => tracing::warn!("Can't decode audio group {}: {}", bank_id, e),
            }
        }

        let mut table = HashMap::new();
        let mut unknown = BTreeSet::new();
        for (sound_id, define_id) in atbl.define_ids.iter().enumerate() {
            match define_to_bank.get(define_id) {
                Some(Some(bank_id)) => {
                    table.insert(sound_id as u32, *bank_id);
                }
                Some(None) => {}
                None => {
                    unknown.insert(*define_id);
                }
            }
        }

        if !unknown.is_empty() {
            tracing::debug!(
                "{} define ids in {} belong to no audio group: {:?}",
                unknown.len(),
                table_id,
                unknown
            );
        }
        tracing::debug!("Audio group table maps {} sounds", table.len());

        Self { banks: table }
    }

    /// The bank providing `sound_id`. `u32::MAX` means "no sound".
    pub fn bank_for(&self, sound_id: u32) -> Option<AssetId> {
        if sound_id == u32::MAX {
            return None;
        }
        self.banks.get(&sound_id).copied()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

/// Dependency cheat for formats that embed ids without a cheap decoder.
///
/// Every 4-byte aligned window of id width is read as an id; those that name
/// an existing asset become edges, each listed once.
pub fn scan_raw_references(
    raw: &RawResource,
    manager: &AssetManager,
    _is_level_walk: bool,
) -> Vec<Dependency> {
    let game = manager.game();
    let width = game.id_width().byte_len();

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    let mut offset = 0;
    while offset + width <= raw.data.len() {
        let mut window = &raw.data[offset..offset + width];
        offset += 4;

        let Ok(asset_id) = read_asset_id(&mut window, game) else {
            continue;
        };
        if !game.is_valid_asset_id(asset_id) || !seen.insert(asset_id) {
            continue;
        }
        if let Ok(asset_type) = manager.asset_type(asset_id) {
            edges.push(Dependency::new(asset_type, asset_id));
        }
    }
    edges
}
