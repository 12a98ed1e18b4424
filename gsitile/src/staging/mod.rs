//! On-disk staging of fetched tiles.
//!
//! Every fetched tile is written to the staging directory before it counts as
//! downloaded. Composition later reads the tiles back from there. Each tile
//! index is written once per run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::tile::TileIndex;

/// Errors raised while writing staged tiles or the final output.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    #[error("Failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    /// Failed to read a file.
    #[error("Failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The output path has no image format the encoder understands.
    #[error("Unsupported output format for '{0}'")]
    UnsupportedFormat(PathBuf),

    /// Encoding the output image failed.
    #[error("Failed to encode '{path}': {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Sequence number of the next staging area opened by `for_run`.
static NEXT_RUN: AtomicUsize = AtomicUsize::new(0);

/// A directory holding the encoded tiles of one run.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Opens a staging area, creating the directory if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), "Staging area ready");
        Ok(Self { dir })
    }

    /// Opens a fresh staging area under `root`, named `<pid>-<run>`.
    ///
    /// Every call within a process gets its own directory, so removing one
    /// run's tiles never touches another's.
    pub fn for_run(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let run = NEXT_RUN.fetch_add(1, Ordering::Relaxed);
        Self::new(
            root.as_ref()
                .join(format!("{}-{}", std::process::id(), run)),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a tile is staged under.
    pub fn tile_path(&self, index: &TileIndex, extension: &str) -> PathBuf {
        self.dir.join(index.staging_name(extension))
    }

    /// Writes the encoded bytes of one tile and returns the file path.
    pub fn write_tile(
        &self,
        index: &TileIndex,
        extension: &str,
        data: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.tile_path(index, extension);
        fs::write(&path, data).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Reads a staged file back.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Removes the staging directory and everything in it.
    ///
    /// Failure is logged and otherwise ignored; the stitched image has
    /// already been produced when this runs.
    pub fn remove(self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove staging directory");
        }
    }
}
