//! Tile indexing and range resolution.
//!
//! This module answers "which tiles cover this request, and where inside
//! them does the request start and end":
//!
//! ```text
//! BoundingBox ──► continuous pixels ──► (tile, remainder) per corner/axis
//!                                              │
//!                                              ▼
//!                                     BoundingTileRect ──► CropWindow
//! ```
//!
//! # Example
//!
//! ```
//! use gsitile::coord::{BoundingBox, GsdMode};
//! use gsitile::tile::TilePlan;
//!
//! let bbox = BoundingBox::from_angles(
//!     36.639413033456435,
//!     36.659306735128496,
//!     138.1776949697821,
//!     138.19938069275926,
//! );
//! let plan = TilePlan::new(&bbox, 18, GsdMode::Compatible).unwrap();
//! assert_eq!(plan.rect.tile_count(), 17 * 19);
//! ```

mod index;
mod range;

pub use index::TileIndex;
pub use range::{AxisBound, BoundingTileRect, CropWindow, TilePlan};
