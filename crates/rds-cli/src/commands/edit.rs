use crate::commands::open_manager;
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::CliConfig;
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;
use rds_assets::{AssetManager, SaveReport};
use rds_common::AssetKey;

pub struct DeleteAssetArgs {
    pub asset: AssetKey,
    pub output_dir: Utf8PathBuf,
}

pub struct CopyAssetArgs {
    pub asset: AssetKey,
    pub archive: String,
    pub output_dir: Utf8PathBuf,
}

/// Delete an asset from every archive and write the changed archives.
pub fn delete_asset(config: &CliConfig, args: DeleteAssetArgs) -> Result<()> {
    let mut manager = open_manager(config)?;
    manager.delete(args.asset).map_err(CliError::from)?;
    save(&mut manager, args.output_dir)
}

/// Copy an asset into another archive and write that archive.
pub fn copy_asset(config: &CliConfig, args: CopyAssetArgs) -> Result<()> {
    let mut manager = open_manager(config)?;
    manager
        .ensure_present(&args.archive, args.asset)
        .map_err(CliError::from)?;
    save(&mut manager, args.output_dir)
}

fn save(manager: &mut AssetManager, output_dir: Utf8PathBuf) -> Result<()> {
    let report = manager.save(&output_dir).map_err(CliError::from)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SaveReport) {
    println_pad!(
        "{} {}",
        "💾 Saved to".bright_green().bold(),
        report.output.as_str().bright_cyan()
    );
    for archive in &report.archives_written {
        println_pad!("   {} {}", "•".bright_cyan(), archive.bright_white());
    }
    println_pad!(
        "{}",
        format!(
            "{} replaced, {} deleted, {} copied in {:.2?}",
            report.replaced, report.deleted, report.copied, report.save_time
        )
        .dimmed()
    );
    if !report.dropped.is_empty() {
        println_pad!(
            "{} {} created assets were not placed in any archive",
            "⚠".bright_yellow(),
            report.dropped.len()
        );
    }
}
