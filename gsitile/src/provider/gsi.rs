//! GSI (Geospatial Information Authority of Japan) tile provider.
//!
//! # API Endpoint
//!
//! Tiles are served as plain XYZ files:
//! `https://cyberjapandata.gsi.go.jp/xyz/{style}/{z}/{x}/{y}.{ext}`
//!
//! # Coordinate System
//!
//! Standard Web Mercator XYZ tile coordinates:
//! - X: Column (0 to 2^zoom - 1, west to east)
//! - Y: Row (0 to 2^zoom - 1, north to south)
//! - Z: Zoom level

use crate::coord::{MAX_ZOOM, MIN_ZOOM};
use crate::provider::{HttpClient, Provider, ProviderError, TileStyle};

/// Host serving the public GSI tiles.
pub const DEFAULT_BASE_URL: &str = "https://cyberjapandata.gsi.go.jp";

/// GSI map tile provider.
///
/// No API key is required.
///
/// # Example
///
/// ```no_run
/// use gsitile::provider::{GsiProvider, Provider, ReqwestClient, TileStyle};
///
/// let client = ReqwestClient::new().unwrap();
/// let provider = GsiProvider::new(client, TileStyle::SeamlessPhoto);
/// let bytes = provider.fetch_tile(18, 231689, 102344).unwrap();
/// ```
pub struct GsiProvider<C: HttpClient> {
    http_client: C,
    style: TileStyle,
    base_url: String,
    name: String,
}

impl<C: HttpClient> GsiProvider<C> {
    /// Creates a provider for the public GSI host.
    pub fn new(http_client: C, style: TileStyle) -> Self {
        Self::with_base_url(http_client, style, DEFAULT_BASE_URL)
    }

    /// Creates a provider for a mirror or test server.
    ///
    /// A trailing slash on `base_url` is ignored.
    pub fn with_base_url(http_client: C, style: TileStyle, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            style,
            base_url,
            name: format!("GSI {}", style),
        }
    }

    /// Builds the tile URL for the given coordinates.
    fn build_url(&self, zoom: u8, x: u32, y: u32) -> String {
        format!(
            "{}/xyz/{}/{}/{}/{}.{}",
            self.base_url,
            self.style.name(),
            zoom,
            x,
            y,
            self.style.extension()
        )
    }
}

impl<C: HttpClient> Provider for GsiProvider<C> {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Vec<u8>, ProviderError> {
        if !self.supports_zoom(zoom) {
            return Err(ProviderError::UnsupportedZoom(zoom));
        }

        let tiles_per_axis = 1u64 << zoom;
        if x as u64 >= tiles_per_axis || y as u64 >= tiles_per_axis {
            return Err(ProviderError::UnsupportedCoordinates { x, y, zoom });
        }

        let url = self.build_url(zoom, x, y);
        self.http_client.get(&url)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn extension(&self) -> &str {
        self.style.extension()
    }

    fn min_zoom(&self) -> u8 {
        MIN_ZOOM
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }
}
