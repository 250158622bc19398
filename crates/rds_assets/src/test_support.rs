//! Fixtures shared by the unit tests.

use crate::manager::AssetManager;
use crate::provider::PathFileProvider;
use camino::{Utf8Path, Utf8PathBuf};
use rds_common::{AssetId, AssetType, Game, RawResource};
use rds_pak::Pak;
use tempfile::TempDir;

pub(crate) type Entry = (u32, AssetType, Vec<u8>);

pub(crate) fn entry(id: u32, asset_type: AssetType, data: &[u8]) -> Entry {
    (id, asset_type, data.to_vec())
}

pub(crate) fn raw(asset_type: AssetType, data: &[u8]) -> RawResource {
    RawResource::new(asset_type, data.to_vec())
}

pub(crate) fn write_archive(root: &Utf8Path, name: &str, game: Game, entries: Vec<Entry>) {
    let mut pak = Pak::new(game);
    for (id, asset_type, data) in entries {
        let id = game.normalize_asset_id(AssetId::from(id));
        pak.add_asset(id, RawResource::new(asset_type, data)).unwrap();
    }

    let path = root.join(name);
    std::fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
    std::fs::write(path.as_std_path(), pak.build().unwrap()).unwrap();
}

/// A temp game directory holding `archives`, and a manager over it.
pub(crate) fn fixture(game: Game, archives: Vec<(&str, Vec<Entry>)>) -> (TempDir, AssetManager) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    for (name, entries) in archives {
        write_archive(&root, name, game, entries);
    }

    let manager = AssetManager::new(PathFileProvider::new(root).unwrap(), game).unwrap();
    (dir, manager)
}

pub(crate) fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}
