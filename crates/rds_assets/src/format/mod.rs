//! Resource format registry.
//!
//! Individual resource codecs live outside this crate; the asset manager only
//! needs to know, per [`AssetType`], how to decode bytes into a [`Resource`]
//! and whether that type can reference other assets at all. That knowledge
//! is collected in a [`FormatRegistry`].
//!
//! Most formats are plain Rust types implementing [`KnownResource`], which
//! gives them a [`Resource`] implementation and lets them be registered with
//! [`FormatRegistry::register`]. Formats that need runtime configuration can
//! implement [`ResourceFormat`] directly.
//!
//! The registry also carries per-type dependency "cheats": functions that
//! find references in the raw bytes of formats that aren't worth decoding.

mod audio_group;
mod dgrp;

pub use audio_group::{Agsc, Atbl, NO_AUDIO_GROUP};
pub use dgrp::Dgrp;

use crate::dependencies::scan_raw_references;
use crate::error::{Error, Result};
use crate::manager::AssetManager;
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use rds_common::{AssetId, AssetType, Dependency, Game, IdWidth, RawResource};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// A decoded asset.
pub trait Resource: Any + fmt::Debug + Send + Sync {
    fn asset_type(&self) -> AssetType;

    /// Encode back into the bytes an archive stores.
    fn build(&self, game: Game) -> Result<Vec<u8>>;

    /// Direct references to other assets.
    ///
    /// `manager` gives access to cross references such as the audio group
    /// table. Level-walk filtering is applied by the caller.
    fn dependencies_for(&self, manager: &AssetManager, is_level_walk: bool) -> Result<Vec<Dependency>>;

    fn clone_box(&self) -> Box<dyn Resource>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Resource {
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast<T: Resource>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast().ok()
    }
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A resource format backed by a concrete Rust type.
pub trait KnownResource: Clone + fmt::Debug + Send + Sync + 'static {
    const ASSET_TYPE: AssetType;

    fn parse(data: &[u8], game: Game) -> Result<Self>;

    fn build(&self, game: Game) -> Result<Vec<u8>>;

    /// Whether assets of this type can reference anything in `game`.
    ///
    /// When `false`, dependency walks stop without decoding.
    fn has_dependencies(_game: Game) -> bool {
        true
    }

    fn dependencies_for(&self, _manager: &AssetManager, _is_level_walk: bool) -> Result<Vec<Dependency>> {
        Ok(Vec::new())
    }
}

impl<T: KnownResource> Resource for T {
    fn asset_type(&self) -> AssetType {
        T::ASSET_TYPE
    }

    fn build(&self, game: Game) -> Result<Vec<u8>> {
        KnownResource::build(self, game)
    }

    fn dependencies_for(&self, manager: &AssetManager, is_level_walk: bool) -> Result<Vec<Dependency>> {
        KnownResource::dependencies_for(self, manager, is_level_walk)
    }

    fn clone_box(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Type-erased decode behaviour for one asset type.
pub trait ResourceFormat: Send + Sync {
    fn asset_type(&self) -> AssetType;

    fn parse(&self, data: &[u8], game: Game) -> Result<Box<dyn Resource>>;

    fn has_dependencies(&self, game: Game) -> bool;
}

struct KnownFormat<T>(PhantomData<fn() -> T>);

impl<T: KnownResource> ResourceFormat for KnownFormat<T> {
    fn asset_type(&self) -> AssetType {
        T::ASSET_TYPE
    }

    fn parse(&self, data: &[u8], game: Game) -> Result<Box<dyn Resource>> {
        Ok(Box::new(T::parse(data, game)?))
    }

    fn has_dependencies(&self, game: Game) -> bool {
        T::has_dependencies(game)
    }
}

/// Finds dependencies in the raw, decompressed bytes of an asset.
pub type DependencyCheat =
    Arc<dyn Fn(&RawResource, &AssetManager, bool) -> Vec<Dependency> + Send + Sync>;

/// Formats that are scanned for references instead of decoded.
pub const PARTICLE_TYPES: [AssetType; 7] = [
    AssetType::PART,
    AssetType::SWHC,
    AssetType::ELSC,
    AssetType::WPSC,
    AssetType::CRSC,
    AssetType::DPSC,
    AssetType::SPSC,
];

/// Type tag to decode behaviour and dependency cheats.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<AssetType, Arc<dyn ResourceFormat>>,
    cheats: HashMap<AssetType, DependencyCheat>,
}

impl Default for FormatRegistry {
    /// The built-in formats ([`Dgrp`], [`Atbl`], [`Agsc`]) plus a raw reference
    /// scan for the particle family.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register::<Dgrp>().register::<Atbl>().register::<Agsc>();
        for asset_type in PARTICLE_TYPES {
            registry.register_cheat(asset_type, scan_raw_references);
        }
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.formats.keys().collect();
        formats.sort();
        let mut cheats: Vec<_> = self.cheats.keys().collect();
        cheats.sort();
        f.debug_struct("FormatRegistry")
            .field("formats", &formats)
            .field("cheats", &cheats)
            .finish()
    }
}

impl FormatRegistry {
    /// A registry that knows no formats at all.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
            cheats: HashMap::new(),
        }
    }

    pub fn register<T: KnownResource>(&mut self) -> &mut Self {
        self.register_format(Arc::new(KnownFormat::<T>(PhantomData)))
    }

    pub fn register_format(&mut self, format: Arc<dyn ResourceFormat>) -> &mut Self {
        self.formats.insert(format.asset_type(), format);
        self
    }

    /// Route dependency discovery for `asset_type` through `cheat`.
    pub fn register_cheat<F>(&mut self, asset_type: AssetType, cheat: F) -> &mut Self
    where
        F: Fn(&RawResource, &AssetManager, bool) -> Vec<Dependency> + Send + Sync + 'static,
    {
        self.cheats.insert(asset_type, Arc::new(cheat));
        self
    }

    pub fn format(&self, asset_type: AssetType) -> Option<&Arc<dyn ResourceFormat>> {
        self.formats.get(&asset_type)
    }

    pub fn cheat(&self, asset_type: AssetType) -> Option<&DependencyCheat> {
        self.cheats.get(&asset_type)
    }

    /// Decode `data` as `asset_type`.
    pub fn parse(&self, asset_type: AssetType, data: &[u8], game: Game) -> Result<Box<dyn Resource>> {
        self.format(asset_type)
            .ok_or(Error::UnknownFormat(asset_type))?
            .parse(data, game)
    }
}

/// Map a short read to a decode error for `asset_type`.
pub(crate) fn short_read(asset_type: AssetType) -> impl Fn(std::io::Error) -> Error {
    move |e| Error::decode(asset_type, e.to_string())
}

pub(crate) fn read_asset_type<R: Read>(reader: &mut R) -> std::io::Result<AssetType> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(AssetType::new(tag))
}

pub(crate) fn read_asset_id<R: Read>(reader: &mut R, game: Game) -> std::io::Result<AssetId> {
    Ok(match game.id_width() {
        IdWidth::U32 => AssetId::from(reader.read_u32::<BE>()?),
        IdWidth::U64 => AssetId::from(reader.read_u64::<BE>()?),
        IdWidth::Guid => {
            let mut bytes = [0u8; 16];
            reader.read_exact(&mut bytes)?;
            AssetId::Guid(Uuid::from_bytes(bytes))
        }
    })
}

pub(crate) fn write_asset_id<W: Write>(
    writer: &mut W,
    asset_id: AssetId,
    asset_type: AssetType,
    game: Game,
) -> Result<()> {
    let invalid = || Error::decode(asset_type, format!("{} does not fit {} ids", asset_id, game));
    match (game.id_width(), asset_id) {
        (IdWidth::U32, AssetId::Int(value)) => {
            writer.write_u32::<BE>(u32::try_from(value).map_err(|_| invalid())?)?
        }
        (IdWidth::U64, AssetId::Int(value)) => writer.write_u64::<BE>(value)?,
        (IdWidth::Guid, AssetId::Guid(guid)) => writer.write_all(guid.as_bytes())?,
        _ => return Err(invalid()),
    }
    Ok(())
}
