//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse `value` with `FromStr`, mapping failure to `InvalidValue`.
fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "provider",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.provider.base_url = v.to_string();
        }
        if let Some(v) = section.get("style") {
            config.provider.style = parse_value(
                "provider",
                "style",
                &v.to_lowercase(),
                "must be one of: std, pale, blank, english, seamlessphoto",
            )?;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("retries") {
            let retries: u32 =
                parse_value("download", "retries", v, "must be a positive integer")?;
            if retries == 0 {
                return Err(invalid("download", "retries", v, "must be at least 1"));
            }
            config.download.retries = retries;
        }
        if let Some(v) = section.get("backoff_ms") {
            config.download.backoff_ms = parse_value(
                "download",
                "backoff_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("parallel") {
            let parallel: usize =
                parse_value("download", "parallel", v, "must be a positive integer")?;
            if parallel == 0 {
                return Err(invalid("download", "parallel", v, "must be at least 1"));
            }
            config.download.parallel = parallel;
        }
        if let Some(v) = section.get("timeout") {
            let secs: u64 = parse_value(
                "download",
                "timeout",
                v,
                "must be a non-negative integer (seconds, 0 disables)",
            )?;
            config.download.timeout = (secs > 0).then_some(secs);
        }
    }

    // [staging] section
    if let Some(section) = ini.section(Some("staging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.staging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("keep_tiles") {
            config.staging.keep_tiles = parse_bool(v);
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("gsd_mode") {
            config.output.gsd_mode = parse_value(
                "output",
                "gsd_mode",
                &v.to_lowercase(),
                "must be 'compatible' or 'corrected'",
            )?;
        }
    }

    Ok(config)
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
