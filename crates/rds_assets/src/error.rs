//! Error types for asset management.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Filesystem, JSON and archive errors convert via `From`.

use crate::converter::AssetDetails;
use camino::Utf8PathBuf;
use rds_common::{AssetId, AssetKey, AssetType, Game};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing `custom_names.json` failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Pak(#[from] rds_pak::PakError),

    /// The root handed to [`PathFileProvider`](crate::PathFileProvider) is not a directory.
    #[error("Not a directory: {0}")]
    InvalidRoot(Utf8PathBuf),

    /// No archive and no pending modification knows this id.
    ///
    /// `key` is what the caller asked for, which may be a name.
    #[error("Unknown asset id {id} (requested as {key})")]
    UnknownAssetId { id: AssetId, key: AssetKey },

    /// The id was deleted in the pending modifications.
    #[error("Asset {key} ({id}) has been deleted")]
    DeletedAsset { id: AssetId, key: AssetKey },

    /// The stored type of an asset differs from the type the caller expected.
    #[error("Expected a {expected} asset, found {actual}")]
    FormatMismatch {
        expected: AssetType,
        actual: AssetType,
    },

    /// The id is a sentinel or doesn't fit the game's id width.
    #[error("{id} is not a valid asset id for {game}")]
    InvalidAssetId { id: AssetId, game: Game },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Unknown archive: {0}")]
    UnknownArchive(String),

    /// No format is registered for this type.
    #[error("No format registered for {0}")]
    UnknownFormat(AssetType),

    /// A resource's bytes could not be decoded.
    #[error("Malformed {asset_type} data: {message}")]
    Decode {
        asset_type: AssetType,
        message: String,
    },

    /// The game's ids are GUIDs, so names can't be hashed into ids.
    #[error("{0} has no asset name hash; register a custom name first")]
    NameHashUnsupported(Game),

    /// An asset was reached again while it was still being converted.
    #[error("Conversion cycle detected at {0}")]
    ConversionCycle(AssetId),

    /// A per-type conversion function failed.
    #[error("Unable to convert {details}: {source}")]
    AssetConversionFailed {
        id: AssetId,
        details: AssetDetails,
        source: Box<Error>,
    },

    #[error("No asset provider for {0}")]
    MissingProvider(Game),

    #[error("No converter for {0}")]
    NoConverter(AssetType),

    /// Free-form failure, mostly for conversion functions.
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn decode(asset_type: AssetType, message: impl Into<String>) -> Self {
        Error::Decode {
            asset_type,
            message: message.into(),
        }
    }
}
