//! Writing the stitched image.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tracing::{info, warn};

use crate::staging::StorageError;

/// Sibling path the image is encoded to before it is moved into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Encodes `image` to `path` in the format named by its extension.
///
/// The image is first written to a sibling `.partial` file and renamed once
/// encoding succeeded, so `path` either holds the complete image or is
/// untouched.
///
/// # Errors
///
/// - `UnsupportedFormat` if the extension names no known image format
/// - `Encode` if encoding fails
/// - `Write` if the encoded file cannot be moved into place
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), StorageError> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| StorageError::UnsupportedFormat(path.to_path_buf()))?;

    let partial = partial_path(path);
    if let Err(e) = image.save_with_format(&partial, format) {
        if partial.exists() {
            if let Err(cleanup) = fs::remove_file(&partial) {
                warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial output");
            }
        }
        return Err(StorageError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }

    fs::rename(&partial, path).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Image saved"
    );
    Ok(())
}
