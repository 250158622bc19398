use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    copy_asset, delete_asset, extract_asset, list_assets, show_dependencies, CopyAssetArgs,
    DeleteAssetArgs, DepsArgs, ExtractAssetArgs, ListAssetsArgs,
};
use miette::Result;
use rds_common::{AssetKey, AssetType, Game};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utils::parse_asset_key;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The directory holding the game's .pak archives
    #[arg(long, global = true)]
    game_root: Option<Utf8PathBuf>,

    /// Which game the archives belong to (prime, echoes, corruption, prime-remaster)
    #[arg(long, global = true)]
    game: Option<Game>,

    /// The configuration file to read instead of rds.toml next to the executable
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every asset in the game
    List {
        /// Only list assets of this type (e.g. TXTR)
        #[arg(short = 't', long = "type")]
        asset_type: Option<AssetType>,
    },
    /// Show what an asset depends on
    Deps {
        /// Asset id (0x-hex, decimal or GUID) or name
        #[arg(value_parser = parse_asset_key)]
        asset: AssetKey,

        /// Walk the way a level manifest is built
        #[arg(long)]
        level: bool,

        /// Follow dependencies all the way down
        #[arg(short, long)]
        recursive: bool,
    },
    /// Write an asset's decompressed bytes to a file
    Extract {
        #[arg(value_parser = parse_asset_key)]
        asset: AssetKey,

        /// The file to write
        #[arg(short, long)]
        output: Utf8PathBuf,
    },
    /// Delete an asset and write the changed archives
    Delete {
        #[arg(value_parser = parse_asset_key)]
        asset: AssetKey,

        /// The directory to write changed archives to
        #[arg(short, long, default_value = "patched")]
        output_dir: Utf8PathBuf,
    },
    /// Copy an asset into another archive and write that archive
    Copy {
        #[arg(value_parser = parse_asset_key)]
        asset: AssetKey,

        /// The archive to copy into, relative to the game directory
        #[arg(long)]
        into: String,

        /// The directory to write changed archives to
        #[arg(short, long, default_value = "patched")]
        output_dir: Utf8PathBuf,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "rds=debug,rds_assets=debug,rds_pak=debug"
    } else {
        "rds=info,rds_assets=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let config = utils::config::load_config(args.config.as_deref())?.merge(args.game_root, args.game);

    match args.command {
        Commands::List { asset_type } => list_assets(&config, ListAssetsArgs { asset_type }),
        Commands::Deps {
            asset,
            level,
            recursive,
        } => show_dependencies(
            &config,
            DepsArgs {
                asset,
                level,
                recursive,
            },
        ),
        Commands::Extract { asset, output } => {
            extract_asset(&config, ExtractAssetArgs { asset, output })
        }
        Commands::Delete { asset, output_dir } => {
            delete_asset(&config, DeleteAssetArgs { asset, output_dir })
        }
        Commands::Copy {
            asset,
            into,
            output_dir,
        } => copy_asset(
            &config,
            CopyAssetArgs {
                asset,
                archive: into,
                output_dir,
            },
        ),
    }
}
