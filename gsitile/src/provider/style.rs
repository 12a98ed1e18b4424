//! GSI tile styles.

use std::fmt;
use std::str::FromStr;

use super::types::ProviderError;

/// Map layers published in the GSI tile pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileStyle {
    /// Standard map
    Std,
    /// Pale map
    Pale,
    /// Blank map
    Blank,
    /// English-labelled map
    English,
    /// Seamless aerial photography
    #[default]
    SeamlessPhoto,
}

impl TileStyle {
    pub const ALL: [TileStyle; 5] = [
        TileStyle::Std,
        TileStyle::Pale,
        TileStyle::Blank,
        TileStyle::English,
        TileStyle::SeamlessPhoto,
    ];

    /// Layer name as it appears in the tile URL.
    pub fn name(&self) -> &'static str {
        match self {
            TileStyle::Std => "std",
            TileStyle::Pale => "pale",
            TileStyle::Blank => "blank",
            TileStyle::English => "english",
            TileStyle::SeamlessPhoto => "seamlessphoto",
        }
    }

    /// Encoded format of the layer's tiles.
    pub fn extension(&self) -> &'static str {
        match self {
            TileStyle::SeamlessPhoto => "jpg",
            TileStyle::Std | TileStyle::Pale | TileStyle::Blank | TileStyle::English => "png",
        }
    }
}

impl fmt::Display for TileStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TileStyle {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TileStyle::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| ProviderError::UnknownStyle(s.to_string()))
    }
}
