use crate::asset_id::AssetId;
use crate::asset_type::AssetType;
use std::fmt;

/// The container-agnostic, un-decoded form of an asset.
///
/// This is the unit stored in archives and in the asset manager's overlay.
/// When `compressed` is set, `data` holds the compressed payload exactly as an
/// archive would store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResource {
    pub asset_type: AssetType,
    pub data: Vec<u8>,
    pub compressed: bool,
}

impl RawResource {
    pub fn new(asset_type: AssetType, data: Vec<u8>) -> Self {
        Self {
            asset_type,
            data,
            compressed: false,
        }
    }

    pub fn compressed(asset_type: AssetType, data: Vec<u8>) -> Self {
        Self {
            asset_type,
            data,
            compressed: true,
        }
    }
}

/// A directed edge from an asset to another asset it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub asset_type: AssetType,
    pub id: AssetId,
    /// Suppressed when building a level's dependency manifest.
    pub exclude_for_mlvl: bool,
    /// Legitimately reachable through several paths.
    pub can_duplicate: bool,
}

impl Dependency {
    pub fn new(asset_type: AssetType, id: impl Into<AssetId>) -> Self {
        Self {
            asset_type,
            id: id.into(),
            exclude_for_mlvl: false,
            can_duplicate: false,
        }
    }

    pub fn excluded_for_mlvl(mut self) -> Self {
        self.exclude_for_mlvl = true;
        self
    }

    pub fn duplicable(mut self) -> Self {
        self.can_duplicate = true;
        self
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep {} {}", self.asset_type, self.id)?;
        if self.exclude_for_mlvl {
            f.write_str(" (non-MLVL)")?;
        }
        Ok(())
    }
}
