//! Command line configuration, read from `rds.toml`.

use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use rds_common::Game;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

pub const CONFIG_FILE: &str = "rds.toml";

/// Defaults for flags that are the same on every run.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    pub game_root: Option<Utf8PathBuf>,
    pub game: Option<Game>,
}

impl CliConfig {
    /// Fill in whatever the command line left out.
    pub fn merge(self, game_root: Option<Utf8PathBuf>, game: Option<Game>) -> Self {
        Self {
            game_root: game_root.or(self.game_root),
            game: game.or(self.game),
        }
    }

    pub fn game_root(&self) -> Result<&Utf8Path, CliError> {
        self.game_root.as_deref().ok_or(CliError::GameRootMissing)
    }

    pub fn game(&self) -> Result<Game, CliError> {
        self.game.ok_or(CliError::GameMissing)
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Load the configuration from `path`, or from `rds.toml` next to the executable.
///
/// An explicit path must exist. The default file is optional.
pub fn load_config(path: Option<&Utf8Path>) -> Result<CliConfig, CliError> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(CliError::ConfigNotFound {
                path: path.to_path_buf(),
            })
        }
        Some(path) => path.to_path_buf(),
        None => match install_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.exists() => path,
            _ => return Ok(CliConfig::default()),
        },
    };

    tracing::debug!("Reading configuration from {}", path);
    parse_config(&fs::read_to_string(&path)?)
}

pub fn parse_config(content: &str) -> Result<CliConfig, CliError> {
    toml::from_str(content).map_err(CliError::config_parse_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = parse_config("game_root = \"/games/echoes\"\ngame = \"echoes\"\n").unwrap();
        assert_eq!(config.game_root, Some(Utf8PathBuf::from("/games/echoes")));
        assert_eq!(config.game, Some(Game::Echoes));
    }

    #[test]
    fn test_parse_config_rejects_unknown_game() {
        assert!(matches!(
            parse_config("game = \"metroid-fusion\"\n"),
            Err(CliError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_flags_override_config() {
        let config = CliConfig {
            game_root: Some(Utf8PathBuf::from("/games/prime")),
            game: Some(Game::Prime),
        };
        let merged = config.merge(None, Some(Game::Echoes));
        assert_eq!(merged.game_root().unwrap(), Utf8Path::new("/games/prime"));
        assert_eq!(merged.game().unwrap(), Game::Echoes);
    }

    #[test]
    fn test_missing_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(CliError::ConfigNotFound { .. })
        ));
    }
}
