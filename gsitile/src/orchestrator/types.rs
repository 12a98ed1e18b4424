//! Orchestrator types and errors

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::ProviderError;
use crate::staging::StorageError;
use crate::tile::TileIndex;

/// Errors that can occur while fetching the tiles of a request.
#[derive(Debug)]
pub enum OrchestratorError {
    /// A tile could not be fetched within its retry budget
    Retrieval {
        tile: TileIndex,
        attempts: u32,
        last_error: ProviderError,
    },
    /// Overall timeout exceeded before every tile was fetched
    Timeout {
        elapsed: Duration,
        tiles_fetched: usize,
        tiles_total: usize,
    },
    /// Writing a fetched tile to the staging area failed
    Storage(StorageError),
    /// The worker pool could not be created
    WorkerPool(String),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Retrieval {
                tile,
                attempts,
                last_error,
            } => write!(
                f,
                "Failed to fetch tile {} after {} attempt(s): {}",
                tile, attempts, last_error
            ),
            OrchestratorError::Timeout {
                elapsed,
                tiles_fetched,
                tiles_total,
            } => write!(
                f,
                "Timeout after {:.1}s: {}/{} tiles fetched",
                elapsed.as_secs_f64(),
                tiles_fetched,
                tiles_total
            ),
            OrchestratorError::Storage(e) => write!(f, "Staging error: {}", e),
            OrchestratorError::WorkerPool(msg) => {
                write!(f, "Failed to start fetch workers: {}", msg)
            }
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrchestratorError::Retrieval { last_error, .. } => Some(last_error),
            OrchestratorError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for OrchestratorError {
    fn from(e: StorageError) -> Self {
        OrchestratorError::Storage(e)
    }
}

/// A tile that has been fetched and written to the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTile {
    pub index: TileIndex,
    pub path: PathBuf,
}

/// Result of fetching every tile of a rectangle.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// Staged tiles sorted column by column (x, then y)
    pub tiles: Vec<StagedTile>,
    /// Number of failed attempts that were retried
    pub retries: usize,
    /// Wall time spent fetching
    pub elapsed: Duration,
}
