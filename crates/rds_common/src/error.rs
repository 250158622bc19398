use thiserror::Error;

/// Errors produced when parsing the textual form of shared types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Asset type tags are exactly four ASCII characters.
    #[error("invalid asset type tag: {0:?}")]
    InvalidAssetType(String),

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("invalid asset id: {0}")]
    InvalidAssetId(String),
}
