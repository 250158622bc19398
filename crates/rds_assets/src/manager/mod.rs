//! The asset manager: one logical view over every archive of a game.
//!
//! An [`AssetManager`] owns four pieces of state:
//!
//! - a [`ContainerIndex`] built from archive headers, answering where an id lives;
//! - an [`Overlay`] of pending replacements, deletions and copy requests;
//! - the [`CustomNames`] table for assets whose names the game can't hash;
//! - a cache of fully parsed archives, filled on first read.
//!
//! Reads consult the overlay first and fall through to the archives. Writes
//! only touch the overlay until [`save`](AssetManager::save) rewrites the
//! affected archives to an output directory, after which the overlay is empty
//! and the index reflects what is on disk.
//!
//! The manager is single threaded. Archive loading uses interior mutability so
//! that reads only need `&self`.
//!
//! # Example
//!
//! ```no_run
//! use rds_assets::{AssetManager, PathFileProvider};
//! use rds_common::{AssetId, Game};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = PathFileProvider::new("/games/echoes/files")?;
//! let mut manager = AssetManager::new(provider, Game::Echoes)?;
//!
//! let raw = manager.raw_asset(AssetId::from(0x7B2EA5B1u32))?;
//! println!("{} bytes of {}", raw.data.len(), raw.asset_type);
//!
//! manager.delete(AssetId::from(0x12345678u32))?;
//! let report = manager.save("/games/echoes/patched")?;
//! println!("Rewrote {} archives", report.archives_written.len());
//! # Ok(())
//! # }
//! ```

mod save;
mod write;

pub use save::{SaveProgress, SaveReport, SaveStage};

use crate::dependencies::AudioGroupTable;
use crate::error::{Error, Result};
use crate::format::{FormatRegistry, KnownResource, Resource};
use crate::index::{ArchiveRef, ContainerIndex};
use crate::names::{CustomNames, CUSTOM_NAMES_FILE};
use crate::overlay::{classify, AssetState, Overlay};
use crate::provider::{ArchiveReader, FileProvider};
use camino::Utf8PathBuf;
use rds_common::{AssetId, AssetKey, AssetType, Game, RawResource};
use rds_pak::{Pak, PakToc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::sync::Arc;

/// First id handed out by [`generate_id`](AssetManager::generate_id) for integer id games.
pub const FIRST_GENERATED_ID: u64 = 0xFFFF_0000;

type ProgressCallback = Arc<dyn Fn(SaveProgress) + Send + Sync>;

pub struct AssetManager {
    provider: Box<dyn FileProvider>,
    game: Game,
    registry: FormatRegistry,
    index: ContainerIndex,
    overlay: Overlay,
    names: CustomNames,
    /// Parsed archives, loaded on first read and dropped on save.
    archives: RefCell<HashMap<ArchiveRef, Pak>>,
    /// Archives rewritten by a save, read from their output path from then on.
    relocated: HashMap<String, Utf8PathBuf>,
    next_generated_id: u64,
    audio_groups: AudioGroupTable,
    progress_callback: Option<ProgressCallback>,
}

impl AssetManager {
    /// Index every archive the provider lists and load the custom name table.
    ///
    /// Archives whose header can't be read for `game` are skipped with a warning.
    pub fn new(provider: impl FileProvider + 'static, game: Game) -> Result<Self> {
        let provider: Box<dyn FileProvider> = Box::new(provider);

        let names = if provider.is_file(CUSTOM_NAMES_FILE) {
            CustomNames::from_json(&provider.read(CUSTOM_NAMES_FILE)?)?
        } else {
            CustomNames::new()
        };

        let mut manager = Self {
            provider,
            game,
            registry: FormatRegistry::default(),
            index: ContainerIndex::new(),
            overlay: Overlay::new(),
            names,
            archives: RefCell::new(HashMap::new()),
            relocated: HashMap::new(),
            next_generated_id: FIRST_GENERATED_ID,
            audio_groups: AudioGroupTable::default(),
            progress_callback: None,
        };

        manager.index = manager.scan_archives()?;
        let audio_groups = AudioGroupTable::build(&manager);
        manager.audio_groups = audio_groups;
        Ok(manager)
    }

    /// Replace the built-in format registry.
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a callback that receives [`SaveProgress`] updates during saves.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(SaveProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn custom_names(&self) -> &CustomNames {
        &self.names
    }

    pub(crate) fn audio_groups(&self) -> &AudioGroupTable {
        &self.audio_groups
    }

    /// Whether there are modifications or copy requests that a save would write.
    pub fn has_pending_changes(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Turn a lookup key into an id.
    ///
    /// Names go through the custom name table first, then the game's name hash.
    pub fn resolve(&self, key: &AssetKey) -> Result<AssetId> {
        match key {
            AssetKey::Id(id) => Ok(self.game.normalize_asset_id(*id)),
            AssetKey::Name(name) => match self.names.get(name) {
                Some(id) => Ok(id),
                None => self
                    .game
                    .hash_asset_id(name)
                    .ok_or(Error::NameHashUnsupported(self.game)),
            },
        }
    }

    /// Classify `key` as resident, overridden, deleted or missing.
    pub fn asset_state(&self, key: impl Into<AssetKey>) -> Result<(AssetId, AssetState<'_>)> {
        let id = self.resolve(&key.into())?;
        Ok((id, classify(&self.overlay, &self.index, id)))
    }

    pub fn asset_exists(&self, key: impl Into<AssetKey>) -> bool {
        self.asset_state(key)
            .map(|(_, state)| state.exists())
            .unwrap_or(false)
    }

    /// The type of an asset, as replaced or as declared by the archive header.
    pub fn asset_type(&self, key: impl Into<AssetKey>) -> Result<AssetType> {
        let key = key.into();
        let id = self.resolve(&key)?;
        match classify(&self.overlay, &self.index, id) {
            AssetState::Overridden(resource) => Ok(resource.asset_type),
            AssetState::Resident(_) => self
                .index
                .asset_type(id)
                .ok_or(Error::UnknownAssetId { id, key }),
            AssetState::Deleted => Err(Error::DeletedAsset { id, key }),
            AssetState::Missing => Err(Error::UnknownAssetId { id, key }),
        }
    }

    /// The uncompressed bytes of an asset.
    ///
    /// Unmodified assets are read from the first archive that contains them.
    pub fn raw_asset(&self, key: impl Into<AssetKey>) -> Result<RawResource> {
        let key = key.into();
        let id = self.resolve(&key)?;
        match classify(&self.overlay, &self.index, id) {
            AssetState::Overridden(resource) => decompressed(resource),
            AssetState::Resident(archives) => {
                for archive in archives {
                    if let Some(resource) = self.with_archive(*archive, |pak| pak.get_asset(id))?? {
                        return Ok(resource);
                    }
                }
                Err(Error::UnknownAssetId { id, key })
            }
            AssetState::Deleted => Err(Error::DeletedAsset { id, key }),
            AssetState::Missing => Err(Error::UnknownAssetId { id, key }),
        }
    }

    /// Decode an asset through the format registry.
    ///
    /// Fails with [`Error::FormatMismatch`] when `expected` is given and differs
    /// from the asset's type.
    pub fn decoded_asset(
        &self,
        key: impl Into<AssetKey>,
        expected: Option<AssetType>,
    ) -> Result<Box<dyn Resource>> {
        let raw = self.raw_asset(key)?;
        if let Some(expected) = expected {
            if expected != raw.asset_type {
                return Err(Error::FormatMismatch {
                    expected,
                    actual: raw.asset_type,
                });
            }
        }
        self.registry.parse(raw.asset_type, &raw.data, self.game)
    }

    /// Decode an asset as a concrete format type.
    pub fn decoded<T: KnownResource>(&self, key: impl Into<AssetKey>) -> Result<T> {
        let raw = self.raw_asset(key)?;
        if raw.asset_type != T::ASSET_TYPE {
            return Err(Error::FormatMismatch {
                expected: T::ASSET_TYPE,
                actual: raw.asset_type,
            });
        }
        T::parse(&raw.data, self.game)
    }

    /// Names of the archives that natively contain an asset.
    pub fn find_archives(&self, key: impl Into<AssetKey>) -> Result<Vec<&str>> {
        let key = key.into();
        let id = self.resolve(&key)?;
        let containers = self
            .index
            .containers(id)
            .ok_or(Error::UnknownAssetId { id, key })?;
        Ok(containers
            .iter()
            .map(|archive| self.index.archive_name(*archive))
            .collect())
    }

    /// Every id that currently exists, sorted.
    pub fn all_asset_ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self
            .index
            .asset_ids()
            .filter(|id| classify(&self.overlay, &self.index, *id).exists())
            .collect();
        ids.sort();
        ids
    }

    /// Every archive name, in enumeration order.
    pub fn all_archives(&self) -> impl Iterator<Item = &str> {
        self.index.archives().map(|(_, name)| name)
    }

    fn scan_archives(&self) -> Result<ContainerIndex> {
        let mut index = ContainerIndex::new();

        for name in self.provider.list_archives()? {
            let toc = self
                .open_archive(&name)
                .and_then(|mut reader| Ok(PakToc::read(&mut reader, self.game)?));
            match toc {
                Ok(toc) => {
                    tracing::debug!("Indexed {} ({} entries)", name, toc.entries.len());
                    index.add_archive(&name, &toc);
                }
                Err(e) => tracing::warn!("Skipping unreadable archive {}: {}", name, e),
            }
        }

        tracing::info!(
            "Indexed {} assets across {} archives",
            index.asset_count(),
            index.archive_count()
        );
        Ok(index)
    }

    fn open_archive(&self, name: &str) -> Result<Box<dyn ArchiveReader>> {
        match self.relocated.get(name) {
            Some(path) => {
                let file = std::fs::File::open(path.as_std_path())?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => self.provider.open(name),
        }
    }

    fn load_archive(&self, archive: ArchiveRef) -> Result<()> {
        if self.archives.borrow().contains_key(&archive) {
            return Ok(());
        }

        let name = self.index.archive_name(archive);
        tracing::info!("Reading {}", name);

        let mut data = Vec::new();
        self.open_archive(name)?.read_to_end(&mut data)?;
        let pak = Pak::parse(&data, self.game)?;

        self.archives.borrow_mut().insert(archive, pak);
        Ok(())
    }

    fn with_archive<T>(&self, archive: ArchiveRef, f: impl FnOnce(&Pak) -> T) -> Result<T> {
        self.load_archive(archive)?;
        let archives = self.archives.borrow();
        let pak = archives
            .get(&archive)
            .ok_or_else(|| Error::UnknownArchive(self.index.archive_name(archive).to_string()))?;
        Ok(f(pak))
    }

    fn emit_progress(&self, progress: SaveProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

fn decompressed(resource: &RawResource) -> Result<RawResource> {
    if !resource.compressed {
        return Ok(resource.clone());
    }
    Ok(RawResource::new(
        resource.asset_type,
        rds_pak::decompress_zstd(&resource.data)?,
    ))
}

impl std::fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetManager")
            .field("game", &self.game)
            .field("archives", &self.index.archive_count())
            .field("assets", &self.index.asset_count())
            .field("pending_changes", &self.has_pending_changes())
            .finish()
    }
}
