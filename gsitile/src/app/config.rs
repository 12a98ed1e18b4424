//! Resolved configuration for one stitch run.
//!
//! `StitchConfig` is what the pipeline actually consumes: the configuration
//! file supplies the base values and command-line flags are layered on top
//! with the `with_*` methods.

use std::path::PathBuf;
use std::time::Duration;

use crate::compose::OutputMode;
use crate::config::ConfigFile;
use crate::coord::GsdMode;
use crate::orchestrator::RetryPolicy;
use crate::provider::TileStyle;

/// Default zoom level.
pub const DEFAULT_ZOOM: u8 = 16;

/// Settings of one stitch run.
#[derive(Clone, Debug, PartialEq)]
pub struct StitchConfig {
    /// Zoom level, 0..=18.
    pub zoom: u8,

    /// Tile style to download.
    pub style: TileStyle,

    /// Tile server base URL.
    pub base_url: String,

    /// Root under which the per-process staging directory is created.
    pub staging_dir: PathBuf,

    /// Leave staged tiles on disk after a successful run.
    pub keep_staged_tiles: bool,

    /// Per-tile retry policy.
    pub retry: RetryPolicy,

    /// Maximum concurrent tile downloads.
    pub max_parallel: usize,

    /// Overall deadline for the download phase.
    pub timeout: Option<Duration>,

    /// Crop to the requested extent or keep the whole canvas.
    pub output_mode: OutputMode,

    /// Y-axis ground sample distance formula.
    pub gsd_mode: GsdMode,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

impl StitchConfig {
    /// Create a run configuration from the loaded configuration file.
    ///
    /// The zoom level and output mode are not part of the file; they start at
    /// [`DEFAULT_ZOOM`] and [`OutputMode::Cropped`].
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            style: config.provider.style,
            base_url: config.provider.base_url.clone(),
            staging_dir: config.staging.directory.clone(),
            keep_staged_tiles: config.staging.keep_tiles,
            retry: config.download.retry_policy(),
            max_parallel: config.download.parallel,
            timeout: config.download.timeout_duration(),
            output_mode: OutputMode::default(),
            gsd_mode: config.output.gsd_mode,
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_style(mut self, style: TileStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_keep_staged_tiles(mut self, keep: bool) -> Self {
        self.keep_staged_tiles = keep;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the number of attempts per tile, keeping the backoff.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_gsd_mode(mut self, mode: GsdMode) -> Self {
        self.gsd_mode = mode;
        self
    }
}
