//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use camino::Utf8PathBuf;
use rds_assets::{AssetManager, Error, FormatRegistry, KnownResource, PathFileProvider, Result};
use rds_common::{AssetId, AssetType, Dependency, Game, RawResource};
use rds_pak::Pak;
use std::io::Cursor;
use tempfile::TempDir;

pub const REFS: AssetType = AssetType::new(*b"REFS");

pub type Entry = (u32, AssetType, Vec<u8>);

/// A test format that lists references, each optionally hidden from level
/// walks, plus sound ids that pull in their audio banks.
///
/// ```text
/// u32 count
/// count x { fourcc type, u32 id, u8 excluded_for_mlvl }
/// u32 sound_count
/// sound_count x u32 sound_id
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefList {
    pub refs: Vec<(AssetType, u32, bool)>,
    pub sounds: Vec<u32>,
}

impl KnownResource for RefList {
    const ASSET_TYPE: AssetType = REFS;

    fn parse(data: &[u8], _game: Game) -> Result<Self> {
        let decode = |e: std::io::Error| Error::Decode {
            asset_type: REFS,
            message: e.to_string(),
        };
        let mut reader = Cursor::new(data);
        let count = reader.read_u32::<BE>().map_err(decode)?;
        let mut refs = Vec::new();
        for _ in 0..count {
            let asset_type = AssetType::from_u32_be(reader.read_u32::<BE>().map_err(decode)?);
            let id = reader.read_u32::<BE>().map_err(decode)?;
            let excluded = reader.read_u8().map_err(decode)? != 0;
            refs.push((asset_type, id, excluded));
        }
        let sound_count = reader.read_u32::<BE>().map_err(decode)?;
        let mut sounds = Vec::new();
        for _ in 0..sound_count {
            sounds.push(reader.read_u32::<BE>().map_err(decode)?);
        }
        Ok(Self { refs, sounds })
    }

    fn build(&self, _game: Game) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        data.write_u32::<BE>(self.refs.len() as u32)?;
        for (asset_type, id, excluded) in &self.refs {
            data.write_u32::<BE>(asset_type.to_u32_be())?;
            data.write_u32::<BE>(*id)?;
            data.write_u8(u8::from(*excluded))?;
        }
        data.write_u32::<BE>(self.sounds.len() as u32)?;
        for sound in &self.sounds {
            data.write_u32::<BE>(*sound)?;
        }
        Ok(data)
    }

    fn dependencies_for(&self, manager: &AssetManager, is_level_walk: bool) -> Result<Vec<Dependency>> {
        let sounds = self
            .sounds
            .iter()
            .filter_map(|sound| manager.audio_group_dependency(*sound, is_level_walk));
        Ok(self
            .refs
            .iter()
            .map(|(asset_type, id, excluded)| {
                let dependency = Dependency::new(*asset_type, *id);
                if *excluded {
                    dependency.excluded_for_mlvl()
                } else {
                    dependency
                }
            })
            .chain(sounds)
            .collect())
    }
}

pub fn refs(refs: &[(AssetType, u32, bool)]) -> Vec<u8> {
    refs_with_sounds(refs, &[])
}

pub fn refs_with_sounds(refs: &[(AssetType, u32, bool)], sounds: &[u32]) -> Vec<u8> {
    let list = RefList {
        refs: refs.to_vec(),
        sounds: sounds.to_vec(),
    };
    KnownResource::build(&list, Game::Echoes).unwrap()
}

pub fn entry(id: u32, asset_type: AssetType, data: &[u8]) -> Entry {
    (id, asset_type, data.to_vec())
}

pub fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

/// A temp game directory holding one archive per `(name, entries)`.
pub fn game_dir(game: Game, archives: Vec<(&str, Vec<Entry>)>) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, entries) in archives {
        let mut pak = Pak::new(game);
        for (id, asset_type, data) in entries {
            let id = game.normalize_asset_id(AssetId::from(id));
            pak.add_asset(id, RawResource::new(asset_type, data)).unwrap();
        }
        std::fs::write(dir.path().join(name), pak.build().unwrap()).unwrap();
    }
    dir
}

/// Route library logs to the test output, filtered by `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A manager over `dir` that also understands [`RefList`].
pub fn open(dir: &TempDir, game: Game) -> AssetManager {
    init_logging();
    let mut registry = FormatRegistry::default();
    registry.register::<RefList>();
    AssetManager::new(PathFileProvider::new(utf8(dir)).unwrap(), game)
        .unwrap()
        .with_registry(registry)
}

pub fn read_pak(path: Utf8PathBuf, game: Game) -> Pak {
    Pak::parse(&std::fs::read(path).unwrap(), game).unwrap()
}
