//! Audio group table (`ATBL`) and audio group banks (`AGSC`).
//!
//! Scripts refer to sounds by sound id. The single `ATBL` asset of a game maps
//! every sound id to a define id, and each `AGSC` bank lists the define ids it
//! provides. Together they answer "which bank must be loaded for this sound".
//!
//! ```text
//! ATBL: u32 count (BE), count x u16 define id (index = sound id)
//! AGSC: u32 count (BE), count x u16 define id, opaque sample data
//! ```

use super::{short_read, KnownResource};
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use crate::error::Result;
use rds_common::{AssetType, Game};
use std::io::{Cursor, Read};

/// Define id used by sounds that belong to no bank.
pub const NO_AUDIO_GROUP: u16 = 0xFFFF;

fn read_define_ids(reader: &mut Cursor<&[u8]>, asset_type: AssetType) -> Result<Vec<u16>> {
    let map_err = short_read(asset_type);
    let count = reader.read_u32::<BE>().map_err(&map_err)?;
    (0..count)
        .map(|_| reader.read_u16::<BE>().map_err(&map_err))
        .collect()
}

fn write_define_ids(data: &mut Vec<u8>, define_ids: &[u16]) -> Result<()> {
    data.write_u32::<BE>(define_ids.len() as u32)?;
    for define_id in define_ids {
        data.write_u16::<BE>(*define_id)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Atbl {
    /// Define id per sound id.
    pub define_ids: Vec<u16>,
}

impl KnownResource for Atbl {
    const ASSET_TYPE: AssetType = AssetType::ATBL;

    fn parse(data: &[u8], _game: Game) -> Result<Self> {
        let mut reader = Cursor::new(data);
        Ok(Self {
            define_ids: read_define_ids(&mut reader, Self::ASSET_TYPE)?,
        })
    }

    fn build(&self, _game: Game) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(4 + self.define_ids.len() * 2);
        write_define_ids(&mut data, &self.define_ids)?;
        Ok(data)
    }

    fn has_dependencies(_game: Game) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Agsc {
    pub define_ids: Vec<u16>,
    pub payload: Vec<u8>,
}

impl KnownResource for Agsc {
    const ASSET_TYPE: AssetType = AssetType::AGSC;

    fn parse(data: &[u8], _game: Game) -> Result<Self> {
        let mut reader = Cursor::new(data);
        let define_ids = read_define_ids(&mut reader, Self::ASSET_TYPE)?;
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Self {
            define_ids,
            payload,
        })
    }

    fn build(&self, _game: Game) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(4 + self.define_ids.len() * 2 + self.payload.len());
        write_define_ids(&mut data, &self.define_ids)?;
        data.extend_from_slice(&self.payload);
        Ok(data)
    }

    fn has_dependencies(_game: Game) -> bool {
        false
    }
}
