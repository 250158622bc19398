//! Dependency group (`DGRP`): a flat list of asset references.
//!
//! ```text
//! u32 count (BE)
//! count x { fourcc type, asset id }
//! ```

use super::{read_asset_id, read_asset_type, short_read, write_asset_id, KnownResource};
use crate::error::{Error, Result};
use crate::manager::AssetManager;
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use rds_common::{AssetId, AssetType, Dependency, Game};
use std::io::{Cursor, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DgrpEntry {
    pub asset_type: AssetType,
    pub asset_id: AssetId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dgrp {
    pub entries: Vec<DgrpEntry>,
}

impl Dgrp {
    pub fn new(entries: impl IntoIterator<Item = (AssetType, AssetId)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(asset_type, asset_id)| DgrpEntry {
                    asset_type,
                    asset_id,
                })
                .collect(),
        }
    }

    pub fn contains(&self, asset_type: AssetType, asset_id: AssetId) -> bool {
        self.entries
            .iter()
            .any(|e| e.asset_type == asset_type && e.asset_id == asset_id)
    }

    pub fn direct_dependencies(&self) -> impl Iterator<Item = Dependency> + '_ {
        self.entries
            .iter()
            .map(|e| Dependency::new(e.asset_type, e.asset_id))
    }
}

impl KnownResource for Dgrp {
    const ASSET_TYPE: AssetType = AssetType::DGRP;

    fn parse(data: &[u8], game: Game) -> Result<Self> {
        let map_err = short_read(Self::ASSET_TYPE);
        let mut reader = Cursor::new(data);

        let count = reader.read_u32::<BE>().map_err(&map_err)?;
        let mut entries = Vec::new();
        for _ in 0..count {
            entries.push(DgrpEntry {
                asset_type: read_asset_type(&mut reader).map_err(&map_err)?,
                asset_id: read_asset_id(&mut reader, game).map_err(&map_err)?,
            });
        }

        if reader.position() as usize != data.len() {
            return Err(Error::decode(
                Self::ASSET_TYPE,
                format!("{} trailing bytes", data.len() - reader.position() as usize),
            ));
        }
        Ok(Self { entries })
    }

    fn build(&self, game: Game) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        data.write_u32::<BE>(self.entries.len() as u32)?;
        for entry in &self.entries {
            data.write_all(entry.asset_type.as_bytes())?;
            write_asset_id(&mut data, entry.asset_id, Self::ASSET_TYPE, game)?;
        }
        Ok(data)
    }

    fn dependencies_for(&self, _manager: &AssetManager, _is_level_walk: bool) -> Result<Vec<Dependency>> {
        Ok(self.direct_dependencies().collect())
    }
}
