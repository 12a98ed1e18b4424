//! Tile index types.

use std::fmt;

use crate::coord::TILE_SIZE;

/// Column/row of a tile in the pyramid at one zoom level.
///
/// - `x` increases eastward
/// - `y` increases southward
///
/// # Example
///
/// ```
/// use gsitile::tile::TileIndex;
///
/// let index = TileIndex::new(231689, 102344);
/// assert_eq!(index.pixel_origin(), (231689 * 256, 102344 * 256));
/// assert_eq!(index.staging_name("jpg"), "231689_102344.jpg");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// Tile column (X coordinate in the pyramid)
    pub x: u32,
    /// Tile row (Y coordinate in the pyramid)
    pub y: u32,
}

impl TileIndex {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Global pixel position of the tile's northwest corner.
    pub fn pixel_origin(&self) -> (u64, u64) {
        (
            self.x as u64 * TILE_SIZE as u64,
            self.y as u64 * TILE_SIZE as u64,
        )
    }

    /// File name used when the tile is staged on disk.
    pub fn staging_name(&self, extension: &str) -> String {
        format!("{}_{}.{}", self.x, self.y, extension)
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}
