//! User configuration file (`~/.gsitile/config.ini`).
//!
//! Every key is optional; a missing file or section leaves the built-in
//! defaults in place. Command-line flags override what is loaded here.
//!
//! ```ini
//! [provider]
//! base_url = https://cyberjapandata.gsi.go.jp
//! style = seamlessphoto
//!
//! [download]
//! retries = 10
//! backoff_ms = 0
//! parallel = 4
//! timeout = 0
//!
//! [staging]
//! directory = ~/gsitile-tmp
//! keep_tiles = false
//!
//! [output]
//! gsd_mode = compatible
//! ```

mod file;
mod parser;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DownloadSettings, OutputSettings, ProviderSettings, StagingSettings,
    DEFAULT_PARALLEL, DEFAULT_STAGING_DIR,
};
