//! Shared vocabulary for Retro engine asset tooling.
//!
//! Every other crate in the workspace speaks in terms of the types defined here:
//!
//! - [`AssetId`] - a 32/64-bit integer or a GUID, depending on the [`Game`]
//! - [`AssetKey`] - how callers address an asset (by id or by name)
//! - [`AssetType`] - the four character tag identifying a resource format
//! - [`RawResource`] - the un-decoded form of an asset as stored in archives
//! - [`Dependency`] - a directed edge from one asset to another

mod asset_id;
mod asset_type;
pub mod error;
mod game;
mod resource;

pub use asset_id::{AssetId, AssetKey};
pub use asset_type::AssetType;
pub use error::ParseError;
pub use game::{Game, IdWidth};
pub use resource::{Dependency, RawResource};
