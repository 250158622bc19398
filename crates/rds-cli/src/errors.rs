use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("No game directory given")]
    #[diagnostic(
        code(config::game_root_missing),
        help("Pass --game-root, or set game_root in rds.toml")
    )]
    GameRootMissing,

    #[error("No game given")]
    #[diagnostic(
        code(config::game_missing),
        help("Pass --game (prime, echoes, corruption, prime-remaster), or set game in rds.toml")
    )]
    GameMissing,

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(config::not_found), help("Check the path given to --config"))]
    ConfigNotFound { path: Utf8PathBuf },

    #[error("Configuration file error")]
    #[diagnostic(
        code(config::parse_error),
        help("Check your rds.toml file for syntax errors")
    )]
    ConfigParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(assets::error))]
    Assets(#[from] rds_assets::Error),

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config_parse_error(source: toml::de::Error) -> Self {
        Self::ConfigParseError { source }
    }
}
