//! Provider types and traits

use std::fmt;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Tile outside the pyramid at this zoom level
    UnsupportedCoordinates { x: u32, y: u32, zoom: u8 },
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// Invalid response data from provider
    InvalidResponse(String),
    /// Tile style name not published by the provider
    UnknownStyle(String),
}

impl ProviderError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::HttpError(_) | ProviderError::InvalidResponse(_)
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::UnsupportedCoordinates { x, y, zoom } => {
                write!(
                    f,
                    "Tile ({}, {}) at zoom {} is outside the tile pyramid",
                    x, y, zoom
                )
            }
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::UnknownStyle(name) => write!(
                f,
                "Unknown tile style '{}' (expected std, pale, blank, english or seamlessphoto)",
                name
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trait for map tile providers.
///
/// Implementors return the encoded bytes of one 256×256 pixel tile of the
/// pyramid. They must be shareable across the fetch worker threads.
pub trait Provider: Send + Sync {
    /// Downloads one encoded tile.
    ///
    /// # Arguments
    ///
    /// * `zoom` - Zoom level
    /// * `x` - Tile column
    /// * `y` - Tile row
    ///
    /// # Returns
    ///
    /// Raw image data in the format reported by [`Provider::extension`].
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Vec<u8>, ProviderError>;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// File extension of the tiles this provider serves (`png`, `jpg`).
    fn extension(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::UnsupportedCoordinates {
            x: 5,
            y: 6,
            zoom: 2,
        };
        assert_eq!(
            err.to_string(),
            "Tile (5, 6) at zoom 2 is outside the tile pyramid"
        );
        assert_eq!(
            ProviderError::HttpError("HTTP 404".to_string()).to_string(),
            "HTTP error: HTTP 404"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::HttpError("timeout".to_string()).is_retryable());
        assert!(ProviderError::InvalidResponse("empty body".to_string()).is_retryable());
        assert!(!ProviderError::UnsupportedZoom(30).is_retryable());
        assert!(!ProviderError::UnsupportedCoordinates { x: 9, y: 9, zoom: 1 }.is_retryable());
    }
}
