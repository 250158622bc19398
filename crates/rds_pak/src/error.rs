use rds_common::{AssetId, Game};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PakError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("binrw error: {0}")]
    BinRw(#[from] binrw::Error),

    #[error("unsupported pak version: {0}")]
    InvalidVersion(u16),

    /// The archive was written for a different id space than the one requested.
    #[error("pak uses {found}-byte asset ids, {game} expects {expected}")]
    IdWidthMismatch { found: u8, expected: u8, game: Game },

    #[error("asset id {0} does not fit this pak's id width")]
    InvalidAssetId(AssetId),

    #[error("unknown asset id: {0}")]
    UnknownAsset(AssetId),

    #[error("asset id {id} is named {name}, can't be removed")]
    NamedAsset { id: AssetId, name: String },

    #[error("entry {id} points outside the pak (offset {offset}, size {size})")]
    EntryOutOfBounds { id: AssetId, offset: u32, size: u32 },

    #[error("resource name is not valid UTF-8")]
    InvalidName,

    #[error("pak too large: {0} bytes")]
    TooLarge(usize),
}
