//! Header and table-of-contents records.
//!
//! A pak starts with a fixed [`PakHeader`], followed by the named resource
//! table and the entry table. Both tables can be enumerated without touching
//! any entry payload, which is what [`PakToc::read`] does.

use crate::error::PakError;
use binrw::{binrw, BinRead, BinWrite};
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use rds_common::{AssetId, AssetType, Game, IdWidth};
use std::io::{self, Read, Seek, Write};
use uuid::Uuid;

/// Current archive version.
pub const PAK_VERSION: u16 = 1;

/// Entry payloads start on this boundary.
pub const DATA_ALIGNMENT: usize = 32;

#[binrw]
#[brw(big, magic = b"RPAK")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakHeader {
    pub version: u16,
    /// Byte length of every asset id in the tables (4, 8 or 16).
    pub id_width: u8,
    pub flags: u8,
    pub named_count: u32,
    pub entry_count: u32,
}

impl PakHeader {
    pub const SIZE: usize = 4 + 2 + 1 + 1 + 4 + 4;
}

/// A resource that is addressable by name from game code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    pub name: String,
    pub asset_type: AssetType,
    pub asset_id: AssetId,
}

impl NamedResource {
    pub(crate) fn size_of(&self, width: IdWidth) -> usize {
        4 + width.byte_len() + 4 + self.name.len()
    }
}

/// One row of the entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PakEntryRecord {
    pub compressed: bool,
    pub asset_type: AssetType,
    pub asset_id: AssetId,
    pub uncompressed_size: u32,
    pub data_size: u32,
    pub data_offset: u32,
}

impl PakEntryRecord {
    pub fn size_of(width: IdWidth) -> usize {
        1 + 3 + 4 + width.byte_len() + 4 + 4 + 4
    }
}

/// Everything in a pak except the entry payloads.
#[derive(Debug, Clone)]
pub struct PakToc {
    pub header: PakHeader,
    pub named: Vec<NamedResource>,
    pub entries: Vec<PakEntryRecord>,
}

impl PakToc {
    /// Read the header and both tables, validating the id width against `game`.
    pub fn read<R: Read + Seek>(reader: &mut R, game: Game) -> Result<Self, PakError> {
        let header = PakHeader::read(reader)?;
        if header.version != PAK_VERSION {
            return Err(PakError::InvalidVersion(header.version));
        }

        let width = game.id_width();
        let expected = width.byte_len() as u8;
        if header.id_width != expected {
            return Err(PakError::IdWidthMismatch {
                found: header.id_width,
                expected,
                game,
            });
        }

        // Counts come from the file; tables grow as records are actually read.
        let mut named = Vec::new();
        for _ in 0..header.named_count {
            let asset_type = read_asset_type(reader)?;
            let asset_id = read_asset_id(reader, width)?;
            let name_len = reader.read_u32::<BE>()?;
            let mut name = Vec::new();
            reader.by_ref().take(u64::from(name_len)).read_to_end(&mut name)?;
            if name.len() != name_len as usize {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            named.push(NamedResource {
                name: String::from_utf8(name).map_err(|_| PakError::InvalidName)?,
                asset_type,
                asset_id,
            });
        }

        let mut entries = Vec::new();
        for _ in 0..header.entry_count {
            let compressed = reader.read_u8()? != 0;
            let mut padding = [0u8; 3];
            reader.read_exact(&mut padding)?;
            entries.push(PakEntryRecord {
                compressed,
                asset_type: read_asset_type(reader)?,
                asset_id: read_asset_id(reader, width)?,
                uncompressed_size: reader.read_u32::<BE>()?,
                data_size: reader.read_u32::<BE>()?,
                data_offset: reader.read_u32::<BE>()?,
            });
        }

        Ok(Self {
            header,
            named,
            entries,
        })
    }
}

pub(crate) fn write_header<W: Write + Seek>(
    writer: &mut W,
    header: &PakHeader,
) -> Result<(), PakError> {
    header.write(writer)?;
    Ok(())
}

pub(crate) fn write_named<W: Write>(
    writer: &mut W,
    named: &NamedResource,
    width: IdWidth,
) -> Result<(), PakError> {
    writer.write_all(named.asset_type.as_bytes())?;
    write_asset_id(writer, named.asset_id, width)?;
    writer.write_u32::<BE>(named.name.len() as u32)?;
    writer.write_all(named.name.as_bytes())?;
    Ok(())
}

pub(crate) fn write_entry<W: Write>(
    writer: &mut W,
    entry: &PakEntryRecord,
    width: IdWidth,
) -> Result<(), PakError> {
    writer.write_u8(u8::from(entry.compressed))?;
    writer.write_all(&[0u8; 3])?;
    writer.write_all(entry.asset_type.as_bytes())?;
    write_asset_id(writer, entry.asset_id, width)?;
    writer.write_u32::<BE>(entry.uncompressed_size)?;
    writer.write_u32::<BE>(entry.data_size)?;
    writer.write_u32::<BE>(entry.data_offset)?;
    Ok(())
}

fn read_asset_type<R: Read>(reader: &mut R) -> Result<AssetType, PakError> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(AssetType::new(tag))
}

fn read_asset_id<R: Read>(reader: &mut R, width: IdWidth) -> Result<AssetId, PakError> {
    Ok(match width {
        IdWidth::U32 => AssetId::from(reader.read_u32::<BE>()?),
        IdWidth::U64 => AssetId::from(reader.read_u64::<BE>()?),
        IdWidth::Guid => {
            let mut bytes = [0u8; 16];
            reader.read_exact(&mut bytes)?;
            AssetId::Guid(Uuid::from_bytes(bytes))
        }
    })
}

fn write_asset_id<W: Write>(
    writer: &mut W,
    asset_id: AssetId,
    width: IdWidth,
) -> Result<(), PakError> {
    match (width, asset_id) {
        (IdWidth::U32, AssetId::Int(value)) => {
            let value = u32::try_from(value).map_err(|_| PakError::InvalidAssetId(asset_id))?;
            writer.write_u32::<BE>(value)?;
        }
        (IdWidth::U64, AssetId::Int(value)) => writer.write_u64::<BE>(value)?,
        (IdWidth::Guid, AssetId::Guid(guid)) => writer.write_all(guid.as_bytes())?,
        _ => return Err(PakError::InvalidAssetId(asset_id)),
    }
    Ok(())
}

/// Round `value` up to the next multiple of [`DATA_ALIGNMENT`].
pub(crate) fn align(value: usize) -> usize {
    value.div_ceil(DATA_ALIGNMENT) * DATA_ALIGNMENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_size() {
        let header = PakHeader {
            version: PAK_VERSION,
            id_width: 4,
            flags: 0,
            named_count: 0,
            entry_count: 0,
        };

        let mut writer = Cursor::new(Vec::new());
        header.write(&mut writer).unwrap();

        assert_eq!(writer.position() as usize, PakHeader::SIZE);
        assert_eq!(&writer.get_ref()[..4], b"RPAK");
    }

    #[test]
    fn test_entry_record_size() {
        let entry = PakEntryRecord {
            compressed: true,
            asset_type: AssetType::TXTR,
            asset_id: AssetId::from(0x1234u32),
            uncompressed_size: 10,
            data_size: 8,
            data_offset: 64,
        };

        let mut writer = Vec::new();
        write_entry(&mut writer, &entry, IdWidth::U32).unwrap();
        assert_eq!(writer.len(), PakEntryRecord::size_of(IdWidth::U32));
    }

    #[test]
    fn test_id_too_wide_for_table() {
        let mut writer = Vec::new();
        let result = write_asset_id(&mut writer, AssetId::Int(1 << 40), IdWidth::U32);
        assert!(matches!(result, Err(PakError::InvalidAssetId(_))));
    }

    fn header_bytes(header: PakHeader) -> Vec<u8> {
        let mut writer = Cursor::new(Vec::new());
        header.write(&mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_huge_entry_count_is_an_error() {
        let bytes = header_bytes(PakHeader {
            version: PAK_VERSION,
            id_width: 4,
            flags: 0,
            named_count: 0,
            entry_count: u32::MAX,
        });

        let result = PakToc::read(&mut Cursor::new(bytes), Game::Echoes);
        assert!(matches!(result, Err(PakError::Io(_))));
    }

    #[test]
    fn test_truncated_name_is_an_error() {
        let mut bytes = header_bytes(PakHeader {
            version: PAK_VERSION,
            id_width: 4,
            flags: 0,
            named_count: 1,
            entry_count: 0,
        });
        bytes.extend_from_slice(b"MLVL");
        bytes.extend_from_slice(&0x10u32.to_be_bytes());
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(b"short");

        let result = PakToc::read(&mut Cursor::new(bytes), Game::Echoes);
        assert!(matches!(result, Err(PakError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_align() {
        assert_eq!(align(0), 0);
        assert_eq!(align(1), 32);
        assert_eq!(align(32), 32);
        assert_eq!(align(33), 64);
    }
}
