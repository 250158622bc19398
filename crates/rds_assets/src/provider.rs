//! Game file access abstraction.
//!
//! The [`AssetManager`](crate::AssetManager) never touches the filesystem
//! directly when reading game data. Everything goes through a [`FileProvider`],
//! so the same manager can run over an extracted disc directory, an in-memory
//! fixture, or any other storage that can list and open archives.
//!
//! The crate ships [`PathFileProvider`] for plain directories.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{BufReader, Read, Seek};

/// File extension of archives, compared case-insensitively.
pub const ARCHIVE_EXTENSION: &str = "pak";

/// A readable, seekable archive stream.
pub trait ArchiveReader: Read + Seek {}

impl<T: Read + Seek> ArchiveReader for T {}

/// Abstracts how game files are located and read.
///
/// Names are relative to the provider root and always use `/` as separator,
/// e.g. `"Worlds/Metroid1.pak"`.
pub trait FileProvider {
    /// Whether `name` exists and is a regular file.
    fn is_file(&self, name: &str) -> bool;

    /// All archives under the root, sorted by name.
    ///
    /// The order is significant: when an asset lives in several archives, the
    /// first listed one is read.
    fn list_archives(&self) -> Result<Vec<String>>;

    /// Open a file for streaming reads.
    fn open(&self, name: &str) -> Result<Box<dyn ArchiveReader>>;

    /// Read a whole file.
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut reader = self.open(name)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Filesystem-backed provider rooted at a directory.
#[derive(Debug, Clone)]
pub struct PathFileProvider {
    root: Utf8PathBuf,
}

impl PathFileProvider {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.as_std_path().is_dir() {
            return Err(Error::InvalidRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl FileProvider for PathFileProvider {
    fn is_file(&self, name: &str) -> bool {
        self.root.join(name).as_std_path().is_file()
    }

    fn list_archives(&self) -> Result<Vec<String>> {
        let mut archives = Vec::new();

        for entry in walkdir::WalkDir::new(self.root.as_std_path()).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(self.root.as_std_path()) else {
                continue;
            };
            let Some(relative) = Utf8Path::from_path(relative) else {
                tracing::warn!("Skipping non-UTF-8 path: {}", entry.path().display());
                continue;
            };

            let is_archive = relative
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
            if is_archive {
                archives.push(to_provider_name(relative));
            }
        }

        archives.sort();
        Ok(archives)
    }

    fn open(&self, name: &str) -> Result<Box<dyn ArchiveReader>> {
        let file = std::fs::File::open(self.root.join(name).as_std_path())?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Join path components with `/` regardless of platform.
fn to_provider_name(path: &Utf8Path) -> String {
    path.components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/")
}
