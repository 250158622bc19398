//! Reader and writer for Retro engine asset archives.
//!
//! A pak bundles many typed, id-keyed entries. The archive layout is:
//!
//! ```text
//! PakHeader              magic "RPAK", version, id width, table sizes
//! named resources        (type, id, name) rows
//! entry table            (compressed, type, id, sizes, offset) rows
//! payloads               one per entry, 32-byte aligned
//! ```
//!
//! [`PakToc::read`] enumerates entries without reading any payload, which is
//! what an index over a whole game directory needs. [`Pak::parse`] loads the
//! full archive into memory so entries can be replaced, removed, or appended,
//! and [`Pak::build`] writes it back out. Parsing and rebuilding an archive
//! that was written by this crate reproduces the original bytes exactly.

use byteorder::WriteBytesExt;
use rds_common::{AssetId, AssetType, Game, RawResource};
use std::io::{self, Cursor, Seek, Write};

mod error;
mod toc;

pub use error::PakError;
pub use toc::{NamedResource, PakEntryRecord, PakHeader, PakToc, DATA_ALIGNMENT, PAK_VERSION};

use toc::{align, write_entry, write_header, write_named};

/// Compression level used for entries that arrive uncompressed but must be stored compressed.
const ZSTD_LEVEL: i32 = 3;

/// A single entry held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PakFile {
    pub asset_id: AssetId,
    pub asset_type: AssetType,
    /// Payload exactly as stored in the archive.
    data: Vec<u8>,
    compressed: bool,
    uncompressed_size: u32,
}

impl PakFile {
    fn from_raw(asset_id: AssetId, raw: RawResource) -> Result<Self, PakError> {
        let uncompressed_size = if raw.compressed {
            zstd::decode_all(raw.data.as_slice())?.len()
        } else {
            raw.data.len()
        };
        Ok(Self {
            asset_id,
            asset_type: raw.asset_type,
            uncompressed_size: u32::try_from(uncompressed_size)
                .map_err(|_| PakError::TooLarge(uncompressed_size))?,
            data: raw.data,
            compressed: raw.compressed,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Payload with compression undone.
    pub fn decompressed(&self) -> Result<Vec<u8>, PakError> {
        if self.compressed {
            Ok(zstd::decode_all(self.data.as_slice())?)
        } else {
            Ok(self.data.clone())
        }
    }

    /// The entry as a [`RawResource`], keeping its stored compression.
    pub fn to_raw(&self) -> RawResource {
        RawResource {
            asset_type: self.asset_type,
            data: self.data.clone(),
            compressed: self.compressed,
        }
    }
}

/// An archive loaded fully into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pak {
    game: Game,
    named: Vec<NamedResource>,
    files: Vec<PakFile>,
}

impl Pak {
    /// Create an empty archive for `game`'s id space.
    pub fn new(game: Game) -> Self {
        Self {
            game,
            named: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Parse a complete archive.
    pub fn parse(data: &[u8], game: Game) -> Result<Self, PakError> {
        let toc = PakToc::read(&mut Cursor::new(data), game)?;

        let mut files = Vec::with_capacity(toc.entries.len());
        for entry in &toc.entries {
            let start = entry.data_offset as usize;
            let end = start + entry.data_size as usize;
            let payload = data.get(start..end).ok_or(PakError::EntryOutOfBounds {
                id: entry.asset_id,
                offset: entry.data_offset,
                size: entry.data_size,
            })?;
            files.push(PakFile {
                asset_id: entry.asset_id,
                asset_type: entry.asset_type,
                data: payload.to_vec(),
                compressed: entry.compressed,
                uncompressed_size: entry.uncompressed_size,
            });
        }

        Ok(Self {
            game,
            named: toc.named,
            files,
        })
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn files(&self) -> &[PakFile] {
        &self.files
    }

    pub fn named_resources(&self) -> &[NamedResource] {
        &self.named
    }

    pub fn contains(&self, asset_id: AssetId) -> bool {
        self.files.iter().any(|f| f.asset_id == asset_id)
    }

    /// Get the first entry for `asset_id`, decompressed.
    pub fn get_asset(&self, asset_id: AssetId) -> Result<Option<RawResource>, PakError> {
        match self.files.iter().find(|f| f.asset_id == asset_id) {
            Some(file) => Ok(Some(RawResource::new(file.asset_type, file.decompressed()?))),
            None => Ok(None),
        }
    }

    /// Get the first entry for `asset_id` as stored, possibly compressed.
    pub fn get_asset_stored(&self, asset_id: AssetId) -> Option<RawResource> {
        self.files
            .iter()
            .find(|f| f.asset_id == asset_id)
            .map(PakFile::to_raw)
    }

    /// Replace every entry for `asset_id` with `asset`.
    pub fn replace_asset(&mut self, asset_id: AssetId, asset: &RawResource) -> Result<(), PakError> {
        let mut found = false;
        for file in self.files.iter_mut().filter(|f| f.asset_id == asset_id) {
            *file = PakFile::from_raw(asset_id, asset.clone())?;
            found = true;
        }

        if !found {
            return Err(PakError::UnknownAsset(asset_id));
        }
        Ok(())
    }

    /// Remove every entry for `asset_id`.
    ///
    /// Named resources are referenced by game code and can't be removed.
    pub fn remove_asset(&mut self, asset_id: AssetId) -> Result<(), PakError> {
        if let Some(named) = self.named.iter().find(|n| n.asset_id == asset_id) {
            return Err(PakError::NamedAsset {
                id: asset_id,
                name: named.name.clone(),
            });
        }

        let before = self.files.len();
        self.files.retain(|f| f.asset_id != asset_id);
        if self.files.len() == before {
            return Err(PakError::UnknownAsset(asset_id));
        }
        Ok(())
    }

    /// Append an entry for `asset_id` unless the archive already has one.
    ///
    /// Returns whether an entry was added.
    pub fn add_asset(&mut self, asset_id: AssetId, asset: RawResource) -> Result<bool, PakError> {
        if self.contains(asset_id) {
            tracing::trace!("Pak already contains {}, not adding", asset_id);
            return Ok(false);
        }
        self.files.push(PakFile::from_raw(asset_id, asset)?);
        Ok(true)
    }

    /// Register a name for an asset.
    pub fn add_named_resource(&mut self, name: impl Into<String>, asset_type: AssetType, asset_id: AssetId) {
        self.named.push(NamedResource {
            name: name.into(),
            asset_type,
            asset_id,
        });
    }

    /// Store `asset_id` zstd-compressed from now on.
    pub fn compress_asset(&mut self, asset_id: AssetId) -> Result<(), PakError> {
        let file = self
            .files
            .iter_mut()
            .find(|f| f.asset_id == asset_id)
            .ok_or(PakError::UnknownAsset(asset_id))?;
        if !file.is_compressed() {
            file.data = compress_zstd(&file.data)?;
            file.compressed = true;
        }
        Ok(())
    }

    /// Serialize the archive into a byte vector.
    pub fn build(&self) -> Result<Vec<u8>, PakError> {
        let mut cursor = Cursor::new(Vec::new());
        self.build_to_writer(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Serialize the archive.
    ///
    /// Offsets are assigned sequentially from the end of the tables, with each
    /// payload aligned to [`DATA_ALIGNMENT`].
    pub fn build_to_writer<W: Write + Seek>(&self, writer: &mut W) -> Result<(), PakError> {
        let width = self.game.id_width();

        let header = PakHeader {
            version: PAK_VERSION,
            id_width: width.byte_len() as u8,
            flags: 0,
            named_count: self.named.len() as u32,
            entry_count: self.files.len() as u32,
        };

        let tables_size = PakHeader::SIZE
            + self.named.iter().map(|n| n.size_of(width)).sum::<usize>()
            + self.files.len() * PakEntryRecord::size_of(width);

        let mut next_offset = align(tables_size);
        let mut records = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let data_offset =
                u32::try_from(next_offset).map_err(|_| PakError::TooLarge(next_offset))?;
            records.push(PakEntryRecord {
                compressed: file.compressed,
                asset_type: file.asset_type,
                asset_id: file.asset_id,
                uncompressed_size: file.uncompressed_size,
                data_size: file.data.len() as u32,
                data_offset,
            });
            next_offset = align(next_offset + file.data.len());
        }

        write_header(writer, &header)?;
        for named in &self.named {
            write_named(writer, named, width)?;
        }
        for record in &records {
            write_entry(writer, record, width)?;
        }
        write_padding(writer, align(tables_size) - tables_size)?;

        for file in &self.files {
            writer.write_all(&file.data)?;
            write_padding(writer, align(file.data.len()) - file.data.len())?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn write_padding<W: Write>(writer: &mut W, count: usize) -> io::Result<()> {
    for _ in 0..count {
        writer.write_u8(0)?;
    }
    Ok(())
}

/// Compress data using Zstd compression (level 3).
pub fn compress_zstd(data: &[u8]) -> Result<Vec<u8>, PakError> {
    Ok(zstd::encode_all(data, ZSTD_LEVEL)?)
}

/// Undo [`compress_zstd`].
pub fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>, PakError> {
    Ok(zstd::decode_all(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pak() -> Pak {
        let mut pak = Pak::new(Game::Echoes);
        pak.add_asset(
            AssetId::from(0x10u32),
            RawResource::new(AssetType::TXTR, vec![1, 2, 3]),
        )
        .unwrap();
        pak.add_asset(
            AssetId::from(0x20u32),
            RawResource::new(AssetType::STRG, b"hello world".repeat(20)),
        )
        .unwrap();
        pak.compress_asset(AssetId::from(0x20u32)).unwrap();
        pak.add_named_resource("Strings", AssetType::STRG, AssetId::from(0x20u32));
        pak
    }

    #[test]
    fn test_build_then_parse() {
        let pak = sample_pak();
        let bytes = pak.build().unwrap();
        let parsed = Pak::parse(&bytes, Game::Echoes).unwrap();

        assert_eq!(parsed, pak);
        assert_eq!(
            parsed.get_asset(AssetId::from(0x20u32)).unwrap().unwrap().data,
            b"hello world".repeat(20)
        );
    }

    #[test]
    fn test_compress_asset_is_idempotent() {
        let mut pak = sample_pak();
        let before = pak.get_asset_stored(AssetId::from(0x20u32)).unwrap().data;
        pak.compress_asset(AssetId::from(0x20u32)).unwrap();

        let flags: Vec<bool> = pak.files().iter().map(PakFile::is_compressed).collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(pak.get_asset_stored(AssetId::from(0x20u32)).unwrap().data, before);
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let bytes = sample_pak().build().unwrap();
        let rebuilt = Pak::parse(&bytes, Game::Echoes).unwrap().build().unwrap();
        assert_eq!(bytes, rebuilt);
    }

    #[test]
    fn test_payloads_are_aligned() {
        let bytes = sample_pak().build().unwrap();
        let toc = PakToc::read(&mut Cursor::new(&bytes), Game::Echoes).unwrap();
        assert_eq!(toc.entries.len(), 2);
        for entry in &toc.entries {
            assert_eq!(entry.data_offset as usize % DATA_ALIGNMENT, 0);
        }
        assert_eq!(toc.named[0].name, "Strings");
    }

    #[test]
    fn test_id_width_mismatch() {
        let bytes = sample_pak().build().unwrap();
        let result = Pak::parse(&bytes, Game::Corruption);
        assert!(matches!(result, Err(PakError::IdWidthMismatch { .. })));
    }

    #[test]
    fn test_replace_and_remove() {
        let mut pak = sample_pak();
        let id = AssetId::from(0x10u32);

        pak.replace_asset(id, &RawResource::new(AssetType::TXTR, vec![9]))
            .unwrap();
        assert_eq!(pak.get_asset(id).unwrap().unwrap().data, vec![9]);

        pak.remove_asset(id).unwrap();
        assert!(!pak.contains(id));
        assert!(matches!(
            pak.remove_asset(id),
            Err(PakError::UnknownAsset(_))
        ));
        assert!(matches!(
            pak.replace_asset(id, &RawResource::new(AssetType::TXTR, vec![])),
            Err(PakError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_named_asset_cannot_be_removed() {
        let mut pak = sample_pak();
        let result = pak.remove_asset(AssetId::from(0x20u32));
        assert!(matches!(result, Err(PakError::NamedAsset { .. })));
    }

    #[test]
    fn test_add_existing_is_noop() {
        let mut pak = sample_pak();
        let added = pak
            .add_asset(
                AssetId::from(0x10u32),
                RawResource::new(AssetType::TXTR, vec![7]),
            )
            .unwrap();
        assert!(!added);
        assert_eq!(pak.files().len(), 2);
    }

    #[test]
    fn test_add_compressed_raw_keeps_payload() {
        let mut pak = Pak::new(Game::Prime);
        let payload = compress_zstd(&[5u8; 64]).unwrap();
        pak.add_asset(
            AssetId::from(1u32),
            RawResource::compressed(AssetType::CMDL, payload.clone()),
        )
        .unwrap();

        let stored = pak.get_asset_stored(AssetId::from(1u32)).unwrap();
        assert!(stored.compressed);
        assert_eq!(stored.data, payload);
        assert_eq!(
            pak.get_asset(AssetId::from(1u32)).unwrap().unwrap().data,
            vec![5u8; 64]
        );
    }

    #[test]
    fn test_guid_ids() {
        let mut pak = Pak::new(Game::PrimeRemaster);
        let id = AssetId::Guid(uuid::Uuid::from_u128(0xABCD));
        pak.add_asset(id, RawResource::new(AssetType::TXTR, vec![1]))
            .unwrap();
        let parsed = Pak::parse(&pak.build().unwrap(), Game::PrimeRemaster).unwrap();
        assert!(parsed.contains(id));
    }
}
