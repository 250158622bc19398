use crate::commands::open_manager;
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::CliConfig;
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use rds_common::AssetKey;
use std::fs;

pub struct ExtractAssetArgs {
    pub asset: AssetKey,
    pub output: Utf8PathBuf,
}

pub fn extract_asset(config: &CliConfig, args: ExtractAssetArgs) -> Result<()> {
    let manager = open_manager(config)?;
    let raw = manager.raw_asset(args.asset.clone()).map_err(CliError::from)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&args.output, &raw.data).into_diagnostic()?;

    println_pad!(
        "{} {} {} {}",
        "📤 Extracted".bright_green().bold(),
        raw.asset_type.to_string().bright_yellow(),
        args.asset.to_string().bright_cyan(),
        format!("({} bytes) to {}", raw.data.len(), args.output).dimmed()
    );
    Ok(())
}
