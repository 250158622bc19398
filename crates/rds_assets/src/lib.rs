//! Asset management for Retro engine games.
//!
//! This crate presents every archive of a game as one registry of assets and
//! lets you change it safely. It supports:
//!
//! - **Lookup by name or id**: names resolve through a custom name table, then the game's hash
//! - **Pending modifications**: replace, create, delete and copy assets without touching disk
//! - **Saving**: rewrite only the archives that changed, into an output directory
//! - **Dependency discovery**: direct edges, level walks and full closures
//! - **Cross-game conversion**: convert an asset and everything it references into another game
//!
//! # Example
//!
//! ```no_run
//! use rds_assets::{AssetManager, PathFileProvider};
//! use rds_common::Game;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = PathFileProvider::new("/games/echoes/files")?;
//! let mut manager = AssetManager::new(provider, Game::Echoes)?
//!     .with_progress(|progress| {
//!         println!("Stage: {:?}, Progress: {}/{}",
//!             progress.stage, progress.current, progress.total);
//!     });
//!
//! for dependency in manager.dependencies_for("Worlds/SandWorld.MLVL", true, false) {
//!     println!("{dependency}");
//! }
//!
//! manager.ensure_present("Metroid2.pak", "Textures/Misc/Sand.TXTR")?;
//! let report = manager.save("/games/echoes/patched")?;
//! println!("Rewrote {} archives", report.archives_written.len());
//! # Ok(())
//! # }
//! ```

pub mod converter;
pub mod dependencies;
pub mod error;
pub mod format;
pub mod id_policy;
pub mod index;
pub mod manager;
pub mod names;
pub mod overlay;
pub mod provider;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use converter::{converter, AssetConverter, AssetDetails, AssetProvider, ConvertedAsset, ResourceConverter};
pub use dependencies::{scan_raw_references, AudioGroupTable, Dependencies};
pub use error::{Error, Result};
pub use format::{Agsc, Atbl, Dgrp, FormatRegistry, KnownResource, Resource, ResourceFormat};
pub use index::{ArchiveRef, ContainerIndex};
pub use manager::{AssetManager, SaveProgress, SaveReport, SaveStage, FIRST_GENERATED_ID};
pub use names::CustomNames;
pub use overlay::{AssetState, Modification, Overlay};
pub use provider::{FileProvider, PathFileProvider};
