use crate::commands::open_manager;
use crate::println_pad;
use crate::utils::config::CliConfig;
use colored::Colorize;
use miette::Result;
use rds_common::AssetType;

pub struct ListAssetsArgs {
    pub asset_type: Option<AssetType>,
}

pub fn list_assets(config: &CliConfig, args: ListAssetsArgs) -> Result<()> {
    let manager = open_manager(config)?;

    let archives: Vec<&str> = manager.all_archives().collect();
    println_pad!(
        "{} {}",
        "📦 Archives:".bright_blue().bold(),
        archives.len().to_string().bright_white().bold()
    );
    for archive in &archives {
        println_pad!("   {} {}", "•".bright_cyan(), archive.bright_cyan());
    }

    let mut listed = 0usize;
    println_pad!("\n{}", "🧾 Assets:".bright_magenta().bold());
    for asset_id in manager.all_asset_ids() {
        let Ok(asset_type) = manager.asset_type(asset_id) else {
            continue;
        };
        if args.asset_type.is_some_and(|wanted| wanted != asset_type) {
            continue;
        }

        let containers = manager.find_archives(asset_id).unwrap_or_default().join(", ");
        println_pad!(
            "   {} {} {}",
            asset_type.to_string().bright_yellow(),
            asset_id.to_string().bright_white(),
            containers.dimmed()
        );
        listed += 1;
    }

    println_pad!(
        "\n{} {}",
        "Total:".bright_green(),
        listed.to_string().bright_white().bold()
    );
    Ok(())
}
