//! Application error types.

use std::fmt;

use crate::compose::ComposeError;
use crate::config::ConfigFileError;
use crate::coord::CoordError;
use crate::orchestrator::OrchestratorError;
use crate::provider::ProviderError;
use crate::staging::StorageError;

/// Errors that can occur during a stitch run.
#[derive(Debug)]
pub enum AppError {
    /// Invalid coordinates, zoom level or angle.
    Input(CoordError),

    /// A tile could not be downloaded.
    Retrieval(OrchestratorError),

    /// Staging or output file error.
    Storage(StorageError),

    /// Tiles could not be decoded or assembled.
    Composition(ComposeError),

    /// Invalid configuration or provider setup.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Input(e) => write!(f, "Invalid input: {}", e),
            AppError::Retrieval(e) => write!(f, "Tile retrieval failed: {}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Composition(e) => write!(f, "Composition failed: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Input(e) => Some(e),
            AppError::Retrieval(e) => Some(e),
            AppError::Storage(e) => Some(e),
            AppError::Composition(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<CoordError> for AppError {
    fn from(e: CoordError) -> Self {
        AppError::Input(e)
    }
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            // Staging failures are storage errors, not retrieval errors
            OrchestratorError::Storage(e) => AppError::Storage(e),
            other => AppError::Retrieval(other),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Storage(e)
    }
}

impl From<ComposeError> for AppError {
    fn from(e: ComposeError) -> Self {
        AppError::Composition(e)
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Config(e.to_string())
    }
}
