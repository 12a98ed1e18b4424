//! Map tile provider abstraction
//!
//! This module provides the traits and the GSI implementation used to
//! download individual map tiles.
//!
//! ```ignore
//! use gsitile::provider::{GsiProvider, ReqwestClient, TileStyle};
//!
//! let http_client = ReqwestClient::new()?;
//! let provider = GsiProvider::new(http_client, TileStyle::SeamlessPhoto);
//! ```

mod gsi;
mod http;
mod style;
mod types;

pub use gsi::{GsiProvider, DEFAULT_BASE_URL};
pub use http::{HttpClient, ReqwestClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use style::TileStyle;
pub use types::{Provider, ProviderError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
