//! Tile composition.
//!
//! Decodes staged tiles, pastes them into one canvas covering the whole
//! [`BoundingTileRect`](crate::tile::BoundingTileRect) and optionally crops the
//! canvas back to the requested extent.
//!
//! ```text
//! staged bytes ──► decode_tile ──► merge ──► crop ──► save_image
//!                                       └──────────────┘ (OutputMode::Merged)
//! ```

mod canvas;
mod output;

use thiserror::Error;

use crate::tile::{CropWindow, TileIndex};

pub use canvas::{crop, crop_to, decode_tile, merge};
pub use output::save_image;

/// Errors raised while assembling the output image.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Tile bytes are not a decodable image.
    #[error("Failed to decode tile: {0}")]
    Decode(#[from] image::ImageError),

    /// A decoded tile is not 256×256 pixels.
    #[error("Tile {index} is {width}x{height}, expected 256x256")]
    TileSize {
        index: TileIndex,
        width: u32,
        height: u32,
    },

    /// A tile of the rectangle was never provided.
    #[error("Tile {0} is missing from the merge input")]
    MissingTile(TileIndex),

    /// The crop window has no area.
    #[error("Crop window {0:?} is empty")]
    EmptyCrop(CropWindow),

    /// The crop window reaches past the canvas.
    #[error("Crop window {window:?} exceeds canvas of {width}x{height}")]
    WindowOutOfBounds {
        window: CropWindow,
        width: u32,
        height: u32,
    },
}

/// Whether the merged canvas is cropped to the requested extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Crop to the requested corners.
    #[default]
    Cropped,
    /// Keep the whole tile-aligned canvas.
    Merged,
}
