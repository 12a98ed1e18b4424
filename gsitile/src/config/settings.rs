//! Settings structs loaded from the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use crate::coord::GsdMode;
use crate::orchestrator::{Backoff, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PARALLEL};
use crate::provider::{TileStyle, DEFAULT_BASE_URL};

/// Default number of concurrent tile downloads.
pub const DEFAULT_PARALLEL: usize = DEFAULT_MAX_PARALLEL;

/// Default staging root, relative to the working directory.
pub const DEFAULT_STAGING_DIR: &str = "tmp";

/// Parsed contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub download: DownloadSettings,
    pub staging: StagingSettings,
    pub output: OutputSettings,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub style: TileStyle,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            style: TileStyle::default(),
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Attempts per tile.
    pub retries: u32,
    /// Fixed wait between attempts in milliseconds; 0 retries immediately.
    pub backoff_ms: u64,
    pub parallel: usize,
    /// Overall timeout in seconds.
    pub timeout: Option<u64>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: 0,
            parallel: DEFAULT_PARALLEL,
            timeout: None,
        }
    }
}

impl DownloadSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = if self.backoff_ms == 0 {
            Backoff::None
        } else {
            Backoff::Fixed(Duration::from_millis(self.backoff_ms))
        };
        RetryPolicy::new(self.retries, backoff)
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// `[staging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSettings {
    pub directory: PathBuf,
    pub keep_tiles: bool,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_STAGING_DIR),
            keep_tiles: false,
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSettings {
    pub gsd_mode: GsdMode,
}
