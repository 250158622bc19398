use crate::commands::open_manager;
use crate::println_pad;
use crate::utils::config::CliConfig;
use colored::Colorize;
use miette::Result;
use rds_common::{AssetKey, Dependency};

pub struct DepsArgs {
    pub asset: AssetKey,
    pub level: bool,
    pub recursive: bool,
}

pub fn show_dependencies(config: &CliConfig, args: DepsArgs) -> Result<()> {
    let manager = open_manager(config)?;

    let dependencies: Vec<Dependency> = if args.recursive {
        manager.dependency_closure([args.asset.clone()], args.level)
    } else {
        manager.dependencies_for(args.asset.clone(), args.level, false).collect()
    };

    println_pad!(
        "{} {} {}",
        "🔗 Dependencies of".bright_blue().bold(),
        args.asset.to_string().bright_cyan().bold(),
        if args.level {
            "(level walk)".dimmed().to_string()
        } else {
            String::new()
        }
    );
    for dependency in &dependencies {
        let mut line = format!(
            "   {} {} {}",
            "•".bright_cyan(),
            dependency.asset_type.to_string().bright_yellow(),
            dependency.id.to_string().bright_white()
        );
        if dependency.exclude_for_mlvl {
            line.push_str(&format!(" {}", "(non-MLVL)".dimmed()));
        }
        println_pad!("{}", line);
    }

    println_pad!(
        "\n{} {}",
        "Total:".bright_green(),
        dependencies.len().to_string().bright_white().bold()
    );
    Ok(())
}
