//! Custom asset name table.
//!
//! Assets created at runtime have no name the game can hash, so their names are
//! kept in a `name -> id` table stored next to the archives as
//! `custom_names.json`. The table is read when the manager starts and
//! rewritten in full on every save.
//!
//! # JSON format
//!
//! ```json
//! {
//!     "MyNewTexture": 4294901760,
//!     "RemasterThing": "5e1d0c5a-8d7e-4b8a-9a27-3b7c2f0f2a11"
//! }
//! ```

use crate::error::{Error, Result};
use camino::Utf8Path;
use rds_common::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the table, relative to the game root.
pub const CUSTOM_NAMES_FILE: &str = "custom_names.json";

/// A one-to-one mapping between names and asset ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomNames {
    names: BTreeMap<String, AssetId>,
}

impl CustomNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn get(&self, name: &str) -> Option<AssetId> {
        self.names.get(name).copied()
    }

    /// The name bound to `asset_id`, if any.
    pub fn name_of(&self, asset_id: AssetId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, id)| **id == asset_id)
            .map(|(name, _)| name.as_str())
    }

    /// Bind `name` to `asset_id`.
    ///
    /// Re-binding a name to the id it already has is a no-op. Binding a name that
    /// points elsewhere, or an id that already has another name, fails.
    pub fn insert(&mut self, name: &str, asset_id: AssetId) -> Result<()> {
        match self.names.get(name) {
            Some(existing) if *existing == asset_id => return Ok(()),
            Some(_) => return Err(Error::AlreadyExists(name.to_string())),
            None => {}
        }
        if let Some(other) = self.name_of(asset_id) {
            return Err(Error::AlreadyExists(format!(
                "{} (named {})",
                asset_id, other
            )));
        }

        self.names.insert(name.to_string(), asset_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AssetId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Write the table as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }
}
