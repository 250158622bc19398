//! Save pipeline.
//!
//! # Algorithm
//!
//! 1. Collect the touched archives: every archive natively containing a
//!    modified id, plus every archive with a non-empty ensure-set.
//! 2. Load all of them.
//! 3. Snapshot the current bytes of every ensured id, so copies reflect
//!    pending replacements.
//! 4. Per archive, apply deletions and replacements for natively contained
//!    ids, then append the ensured snapshots.
//! 5. Serialize each archive in memory and write it under the output
//!    directory at the same relative path, creating parents.
//! 6. Write `custom_names.json`.
//! 7. Clear the overlay and rebuild the index, reading rewritten archives
//!    from the output directory from now on.
//!
//! Step 5 is the only step that touches the disk. Each archive is fully
//! updated in memory before its file is written, but a failure partway
//! through step 5 can leave an earlier archive written and a later one not.

use super::AssetManager;
use crate::dependencies::AudioGroupTable;
use crate::error::{Error, Result};
use crate::index::ArchiveRef;
use crate::names::CUSTOM_NAMES_FILE;
use crate::overlay::Modification;
use camino::{Utf8Path, Utf8PathBuf};
use rds_common::{AssetId, RawResource};
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// Progress information emitted during a save.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgress {
    pub stage: SaveStage,
    /// Archive being written (set during `WritingArchive`).
    pub current_file: Option<String>,
    /// 1-based index of the archive being written.
    pub current: u32,
    pub total: u32,
}

/// Emitted in order: `Collecting` -> `WritingArchive` (repeated) -> `WritingNames` -> `Reindexing` -> `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveStage {
    Collecting,
    WritingArchive,
    WritingNames,
    Reindexing,
    Complete,
}

/// Summary returned after a save completes.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub output: Utf8PathBuf,
    /// Archive names (relative to the output directory) that were rewritten.
    pub archives_written: Vec<String>,
    /// Archive entries replaced.
    pub replaced: usize,
    /// Archive entries removed.
    pub deleted: usize,
    /// Assets copied into archives that didn't contain them.
    pub copied: usize,
    /// Created assets that were in no archive and are gone after the save.
    pub dropped: Vec<AssetId>,
    pub save_time: Duration,
}

impl AssetManager {
    /// Write every pending modification to `output`. See the module docs.
    pub fn save(&mut self, output: impl AsRef<Utf8Path>) -> Result<SaveReport> {
        let output = output.as_ref();
        let start_time = Instant::now();

        tracing::info!("Saving modifications to {}", output);
        self.emit_progress(SaveProgress {
            stage: SaveStage::Collecting,
            current_file: None,
            current: 0,
            total: 0,
        });

        let touched = self.touched_archives();
        let dropped = self.dropped_assets();
        for asset_id in &dropped {
            tracing::warn!(
                "Asset {} is not in any archive and will be dropped by this save",
                asset_id
            );
        }

        for archive in &touched {
            self.load_archive(*archive)?;
        }

        let mut snapshots: HashMap<AssetId, RawResource> = HashMap::new();
        for archive in self.overlay.ensured_archives() {
            for asset_id in self.overlay.ensured_in(archive) {
                if !snapshots.contains_key(&asset_id) {
                    snapshots.insert(asset_id, self.raw_asset(asset_id)?);
                }
            }
        }

        let total = touched.len() as u32;
        let mut report = SaveReport {
            output: output.to_path_buf(),
            archives_written: Vec::with_capacity(touched.len()),
            replaced: 0,
            deleted: 0,
            copied: 0,
            dropped,
            save_time: Duration::ZERO,
        };
        let mut written: Vec<(String, Utf8PathBuf)> = Vec::with_capacity(touched.len());

        for (idx, archive) in touched.iter().enumerate() {
            let name = self.index.archive_name(*archive).to_string();
            self.emit_progress(SaveProgress {
                stage: SaveStage::WritingArchive,
                current_file: Some(name.clone()),
                current: (idx + 1) as u32,
                total,
            });

            let mut pak = self
                .archives
                .get_mut()
                .remove(archive)
                .ok_or_else(|| Error::UnknownArchive(name.clone()))?;

            tracing::info!("Updating {}", name);
            for (asset_id, modification) in self.overlay.modifications() {
                if !self.index.is_in(asset_id, *archive) {
                    continue;
                }
                match modification {
                    Modification::Deleted => {
                        pak.remove_asset(asset_id)?;
                        report.deleted += 1;
                    }
                    Modification::Replaced(resource) => {
                        pak.replace_asset(asset_id, resource)?;
                        report.replaced += 1;
                    }
                }
            }

            for asset_id in self.overlay.ensured_in(*archive) {
                if let Some(resource) = snapshots.get(&asset_id) {
                    if pak.add_asset(asset_id, resource.clone())? {
                        report.copied += 1;
                    }
                }
            }

            let out_path = output.join(&name);
            tracing::info!("Writing {}", out_path);
            let data = pak.build()?;
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent.as_std_path())?;
            }
            std::fs::write(out_path.as_std_path(), data)?;

            report.archives_written.push(name.clone());
            written.push((name, out_path));
        }

        self.emit_progress(SaveProgress {
            stage: SaveStage::WritingNames,
            current_file: Some(CUSTOM_NAMES_FILE.to_string()),
            current: total,
            total,
        });
        self.names.save(&output.join(CUSTOM_NAMES_FILE))?;

        self.emit_progress(SaveProgress {
            stage: SaveStage::Reindexing,
            current_file: None,
            current: total,
            total,
        });
        self.overlay.clear();
        self.relocated.extend(written);
        self.archives.get_mut().clear();
        self.index = self.scan_archives()?;
        let audio_groups = AudioGroupTable::build(self);
        self.audio_groups = audio_groups;

        report.save_time = start_time.elapsed();
        tracing::info!(
            "Save complete: {} archives written ({} replaced, {} deleted, {} copied) in {:?}",
            report.archives_written.len(),
            report.replaced,
            report.deleted,
            report.copied,
            report.save_time
        );

        self.emit_progress(SaveProgress {
            stage: SaveStage::Complete,
            current_file: None,
            current: total,
            total,
        });
        Ok(report)
    }

    fn touched_archives(&self) -> BTreeSet<ArchiveRef> {
        let mut touched = BTreeSet::new();
        for (asset_id, _) in self.overlay.modifications() {
            if let Some(containers) = self.index.containers(asset_id) {
                touched.extend(containers.iter().copied());
            }
        }
        touched.extend(self.overlay.ensured_archives());
        touched
    }

    /// Replaced ids that no archive contains and none is asked to.
    fn dropped_assets(&self) -> Vec<AssetId> {
        self.overlay
            .modifications()
            .filter(|(asset_id, modification)| {
                matches!(modification, Modification::Replaced(_))
                    && self
                        .index
                        .containers(*asset_id)
                        .map_or(true, |containers| containers.is_empty())
                    && !self.overlay.is_ensured(*asset_id)
            })
            .map(|(asset_id, _)| asset_id)
            .collect()
    }
}
