use crate::utils::config::CliConfig;
use miette::Result;
use rds_assets::{AssetManager, PathFileProvider};

mod deps;
mod edit;
mod extract;
mod list;

pub use deps::{show_dependencies, DepsArgs};
pub use edit::{copy_asset, delete_asset, CopyAssetArgs, DeleteAssetArgs};
pub use extract::{extract_asset, ExtractAssetArgs};
pub use list::{list_assets, ListAssetsArgs};

/// Open the configured game directory.
pub fn open_manager(config: &CliConfig) -> Result<AssetManager> {
    let root = config.game_root()?;
    let game = config.game()?;
    tracing::info!("Opening {} data at {}", game, root);

    let provider = PathFileProvider::new(root.to_path_buf()).map_err(crate::errors::CliError::from)?;
    let manager = AssetManager::new(provider, game)
        .map_err(crate::errors::CliError::from)?
        .with_progress(|progress| {
            tracing::debug!(
                "{:?} {}/{} {}",
                progress.stage,
                progress.current,
                progress.total,
                progress.current_file.as_deref().unwrap_or_default()
            );
        });
    Ok(manager)
}
