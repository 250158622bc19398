//! Mutations. Everything here only touches the overlay, the name table and
//! the in-memory index; nothing is written until a save.

use super::AssetManager;
use crate::error::{Error, Result};
use crate::format::Resource;
use rds_common::{AssetId, AssetKey, IdWidth, RawResource};
use uuid::Uuid;

impl AssetManager {
    /// Replace an existing asset.
    ///
    /// See [`create`](Self::create) for assets that don't exist yet.
    pub fn replace(&mut self, key: impl Into<AssetKey>, resource: RawResource) -> Result<()> {
        let key = key.into();
        let id = self.resolve(&key)?;
        if !self.asset_exists(id) {
            return Err(Error::UnknownAssetId { id, key });
        }

        tracing::debug!("Replacing {} ({}, {})", id, key, resource.asset_type);
        self.overlay.replace(id, resource);
        Ok(())
    }

    /// Encode `resource` and [`replace`](Self::replace) the asset with it.
    pub fn replace_decoded(&mut self, key: impl Into<AssetKey>, resource: &dyn Resource) -> Result<()> {
        let key = key.into();
        tracing::debug!("Encoding {} ({})", key, resource.asset_type());
        let raw = RawResource::new(resource.asset_type(), resource.build(self.game)?);
        self.replace(key, raw)
    }

    /// Add an asset that doesn't exist yet and place it in `archives`.
    ///
    /// Creating by name binds the name in the custom name table. For games
    /// without a name hash, an unbound name gets a freshly generated id.
    pub fn create(
        &mut self,
        key: impl Into<AssetKey>,
        resource: RawResource,
        archives: &[&str],
    ) -> Result<AssetId> {
        let key = key.into();

        let targets = archives
            .iter()
            .map(|name| {
                self.index
                    .archive(name)
                    .ok_or_else(|| Error::UnknownArchive(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let id = match self.resolve(&key) {
            Err(Error::NameHashUnsupported(_)) => self.generate_id(),
            other => other?,
        };
        self.check_valid_id(id)?;
        if self.asset_exists(id) {
            return Err(Error::AlreadyExists(key.to_string()));
        }

        if let AssetKey::Name(name) = &key {
            self.names.insert(name, id)?;
        }

        tracing::debug!("Creating {} as {} ({})", key, id, resource.asset_type);
        self.index.add_unplaced(id, resource.asset_type);
        self.overlay.replace(id, resource);
        for target in targets {
            if !self.index.is_in(id, target) {
                self.overlay.ensure(target, id);
            }
        }
        Ok(id)
    }

    /// Encode `resource` and [`create`](Self::create) an asset with it.
    pub fn create_decoded(
        &mut self,
        key: impl Into<AssetKey>,
        resource: &dyn Resource,
        archives: &[&str],
    ) -> Result<AssetId> {
        let raw = RawResource::new(resource.asset_type(), resource.build(self.game)?);
        self.create(key, raw, archives)
    }

    /// Delete an existing asset from every archive that contains it.
    pub fn delete(&mut self, key: impl Into<AssetKey>) -> Result<()> {
        let key = key.into();
        let id = self.resolve(&key)?;
        if !self.asset_exists(id) {
            return Err(Error::UnknownAssetId { id, key });
        }

        tracing::debug!("Deleting {} ({})", id, key);
        self.overlay.delete(id);
        Ok(())
    }

    /// Make sure `archive` contains the asset after the next save, copying it
    /// from wherever it currently lives.
    pub fn ensure_present(&mut self, archive: &str, key: impl Into<AssetKey>) -> Result<()> {
        let target = self
            .index
            .archive(archive)
            .ok_or_else(|| Error::UnknownArchive(archive.to_string()))?;

        let key = key.into();
        let id = self.resolve(&key)?;
        if !self.asset_exists(id) {
            return Err(Error::UnknownAssetId { id, key });
        }

        if !self.index.is_in(id, target) && self.overlay.ensure(target, id) {
            tracing::debug!("Ensuring {} in {}", id, archive);
        }
        Ok(())
    }

    /// Bind `name` to an id that doesn't exist yet.
    pub fn register_custom_asset_name(&mut self, name: &str, asset_id: impl Into<AssetId>) -> Result<()> {
        let asset_id = self.game.normalize_asset_id(asset_id.into());
        self.check_valid_id(asset_id)?;
        if self.asset_exists(asset_id) {
            return Err(Error::AlreadyExists(asset_id.to_string()));
        }
        self.names.insert(name, asset_id)
    }

    fn check_valid_id(&self, id: AssetId) -> Result<()> {
        if self.game.is_valid_asset_id(id) {
            Ok(())
        } else {
            Err(Error::InvalidAssetId { id, game: self.game })
        }
    }

    /// Allocate an id no existing asset uses.
    ///
    /// Integer ids count up from [`FIRST_GENERATED_ID`](super::FIRST_GENERATED_ID);
    /// GUID games get random v4 GUIDs. Ids handed out are never reused by this
    /// manager, even if no asset was created with them.
    pub fn generate_id(&mut self) -> AssetId {
        if self.game.id_width() == IdWidth::Guid {
            loop {
                let id = AssetId::Guid(Uuid::new_v4());
                if !self.asset_exists(id) {
                    return id;
                }
            }
        }

        let max = match self.game.id_width() {
            IdWidth::U32 => u64::from(u32::MAX),
            _ => u64::MAX,
        };
        let mut candidate = self.next_generated_id;
        loop {
            let id = AssetId::Int(candidate);
            if self.game.is_valid_asset_id(id) && !self.asset_exists(id) {
                self.next_generated_id = candidate.wrapping_add(1);
                return id;
            }
            candidate = if candidate >= max { 1 } else { candidate + 1 };
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::manager::FIRST_GENERATED_ID;
    use crate::test_support::{entry, fixture, raw};
    use crate::Error;
    use rds_common::{AssetId, AssetType, Game};

    #[test]
    fn test_generate_id_skips_existing() {
        let (_dir, mut manager) = fixture(
            Game::Echoes,
            vec![("a.pak", vec![entry(FIRST_GENERATED_ID as u32, AssetType::TXTR, b"x")])],
        );

        let first = manager.generate_id();
        let second = manager.generate_id();
        assert_eq!(first, AssetId::Int(FIRST_GENERATED_ID + 1));
        assert_eq!(second, AssetId::Int(FIRST_GENERATED_ID + 2));
    }

    #[test]
    fn test_generate_id_guid() {
        let (_dir, mut manager) = fixture(Game::PrimeRemaster, vec![]);
        let id = manager.generate_id();
        assert!(id.is_guid());
        assert!(Game::PrimeRemaster.is_valid_asset_id(id));
    }

    #[test]
    fn test_create_by_name_binds_custom_name() {
        let (_dir, mut manager) = fixture(Game::Echoes, vec![("a.pak", vec![])]);

        let id = manager
            .create("MyTexture", raw(AssetType::TXTR, b"tex"), &["a.pak"])
            .unwrap();
        assert_eq!(manager.custom_names().get("MyTexture"), Some(id));
        assert_eq!(manager.asset_type("MyTexture").unwrap(), AssetType::TXTR);
    }

    #[test]
    fn test_create_by_name_on_guid_game_generates_id() {
        let (_dir, mut manager) = fixture(Game::PrimeRemaster, vec![("a.pak", vec![])]);

        let id = manager
            .create("NewThing", raw(AssetType::STRG, b"s"), &["a.pak"])
            .unwrap();
        assert!(id.is_guid());
        assert!(manager.asset_exists("NewThing"));
    }

    #[test]
    fn test_create_validates_archives_first() {
        let (_dir, mut manager) = fixture(Game::Echoes, vec![("a.pak", vec![])]);

        let result = manager.create(0x50u32, raw(AssetType::TXTR, b"t"), &["a.pak", "nope.pak"]);
        assert!(matches!(result, Err(Error::UnknownArchive(_))));
        assert!(!manager.asset_exists(0x50u32));
    }

    #[test]
    fn test_create_rejects_ids_the_game_cannot_store() {
        let (_dir, mut manager) = fixture(Game::Echoes, vec![("a.pak", vec![])]);

        for id in [AssetId::Int(1 << 40), AssetId::from(u32::MAX)] {
            let result = manager.create(id, raw(AssetType::TXTR, b"t"), &["a.pak"]);
            assert!(matches!(
                result,
                Err(Error::InvalidAssetId { game: Game::Echoes, .. })
            ));
        }
        assert!(!manager.has_pending_changes());
        assert!(manager.all_asset_ids().is_empty());
    }

    #[test]
    fn test_register_custom_name_rejects_invalid_id() {
        let (_dir, mut manager) = fixture(Game::Echoes, vec![]);

        let result = manager.register_custom_asset_name("Wide", AssetId::Int(1 << 40));
        assert!(matches!(result, Err(Error::InvalidAssetId { .. })));
        assert_eq!(manager.custom_names().get("Wide"), None);
    }

    #[test]
    fn test_register_custom_name_rejects_existing_id() {
        let (_dir, mut manager) = fixture(
            Game::Echoes,
            vec![("a.pak", vec![entry(0x10, AssetType::TXTR, b"x")])],
        );

        assert!(manager.register_custom_asset_name("Taken", 0x10u32).is_err());
        manager.register_custom_asset_name("Free", 0x11u32).unwrap();
        assert!(manager.register_custom_asset_name("Free", 0x12u32).is_err());
        assert_eq!(
            manager.resolve(&"Free".into()).unwrap(),
            AssetId::from(0x11u32)
        );
    }
}
