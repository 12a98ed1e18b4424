//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use gsitile::app::AppError;
use gsitile::config::ConfigFileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or flag error
    Config(String),
    /// The stitch run failed
    Stitch(AppError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Stitch(AppError::Retrieval(_)) => {
                eprintln!();
                eprintln!("No image was written. Common issues:");
                eprintln!("  1. No network access to the tile server");
                eprintln!("  2. The style has no tiles at this zoom level or location");
                eprintln!("  3. Transient server errors: retry with a higher --retries");
            }
            CliError::Stitch(AppError::Input(_)) => {
                eprintln!();
                eprintln!("Latitudes must lie within ±85.05112878°, longitudes within ±180°");
                eprintln!("and the zoom level within 0..=18.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Stitch(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Stitch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Stitch(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
