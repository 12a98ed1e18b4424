//! Tile range resolution.
//!
//! Turns the two corners of a request into the inclusive rectangle of tiles
//! that covers them, together with the pixel offsets needed to crop the
//! stitched canvas back to the exact request.

use tracing::{debug, warn};

use crate::coord::{
    continuous_pixel, ground_sample_distance, pixel_coord, tile_index_and_remainder,
    validate_zoom, BoundingBox, CoordError, GroundSampleDistance, GsdMode, PixelPoint, TILE_SIZE,
};
use crate::tile::TileIndex;

/// Tile index and in-tile pixel offset of one corner along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AxisBound {
    pub tile: u32,
    pub remainder: u32,
}

impl AxisBound {
    /// Splits a continuous pixel coordinate into tile and remainder.
    ///
    /// The far edge of the pyramid (`2^(zoom+8)`, reached at longitude 180
    /// or the southern clamp latitude) is reported as the last tile with a
    /// full-width remainder, so the tile index never leaves `0..2^zoom`.
    fn from_pixel(pixel: f64, zoom: u8) -> Self {
        let (tile, remainder) = tile_index_and_remainder(pixel);
        let last = (1u32 << zoom) - 1;
        if tile > last {
            return Self {
                tile: last,
                remainder: TILE_SIZE,
            };
        }
        Self { tile, remainder }
    }
}

/// Orders two bounds so the first is the minimum.
///
/// Tiles decide; within the same tile the smaller remainder is the minimum so
/// the result does not depend on corner order.
fn order(a: AxisBound, b: AxisBound) -> (AxisBound, AxisBound) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Pixel window inside a canvas; left/top inclusive, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropWindow {
    /// Window covering a whole image of the given size.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Inclusive rectangle of tiles covering a request.
///
/// Invariant: `min_x <= max_x` and `min_y <= max_y`. Each edge carries the
/// remainder of the corner that ended up on that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingTileRect {
    pub min_x: AxisBound,
    pub max_x: AxisBound,
    pub min_y: AxisBound,
    pub max_y: AxisBound,
}

impl BoundingTileRect {
    /// Resolves the covering tile rectangle for a bounding box.
    ///
    /// # Errors
    ///
    /// Returns `CoordError` if a corner lies outside the projection or the
    /// zoom level is not served.
    pub fn resolve(bbox: &BoundingBox, zoom: u8) -> Result<Self, CoordError> {
        validate_zoom(zoom)?;
        bbox.corner0.validate()?;
        bbox.corner1.validate()?;

        let (x0, y0) = continuous_pixel(bbox.corner0.lon, bbox.corner0.lat, zoom);
        let (x1, y1) = continuous_pixel(bbox.corner1.lon, bbox.corner1.lat, zoom);

        let (min_x, max_x) = order(
            AxisBound::from_pixel(x0, zoom),
            AxisBound::from_pixel(x1, zoom),
        );
        let (min_y, max_y) = order(
            AxisBound::from_pixel(y0, zoom),
            AxisBound::from_pixel(y1, zoom),
        );

        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Number of tile columns.
    pub fn columns(&self) -> u32 {
        self.max_x.tile - self.min_x.tile + 1
    }

    /// Number of tile rows.
    pub fn rows(&self) -> u32 {
        self.max_y.tile - self.min_y.tile + 1
    }

    /// Total number of tiles in the rectangle.
    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Size of the merged canvas in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.columns() * TILE_SIZE, self.rows() * TILE_SIZE)
    }

    pub fn contains(&self, index: &TileIndex) -> bool {
        (self.min_x.tile..=self.max_x.tile).contains(&index.x)
            && (self.min_y.tile..=self.max_y.tile).contains(&index.y)
    }

    /// Offset of a tile's top-left pixel inside the merged canvas.
    pub fn canvas_offset(&self, index: &TileIndex) -> (u32, u32) {
        (
            (index.x - self.min_x.tile) * TILE_SIZE,
            (index.y - self.min_y.tile) * TILE_SIZE,
        )
    }

    /// Iterates all tiles, column by column: x from min to max, and for each
    /// x, y from min to max.
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        (self.min_x.tile..=self.max_x.tile).flat_map(move |x| {
            (self.min_y.tile..=self.max_y.tile).map(move |y| TileIndex::new(x, y))
        })
    }

    /// Window of the merged canvas that matches the requested extent.
    pub fn crop_window(&self) -> CropWindow {
        CropWindow {
            left: self.min_x.remainder,
            top: self.min_y.remainder,
            right: (self.max_x.tile - self.min_x.tile) * TILE_SIZE + self.max_x.remainder,
            bottom: (self.max_y.tile - self.min_y.tile) * TILE_SIZE + self.max_y.remainder,
        }
    }
}

/// Everything derived from a request before any tile is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    pub bbox: BoundingBox,
    pub zoom: u8,
    pub rect: BoundingTileRect,
    /// Signed pixel extent `(x1 - x0, y0 - y1)` of the rounded corner pixels.
    pub span: PixelPoint,
    /// `None` when the request collapses to a single pixel row or column.
    pub gsd: Option<GroundSampleDistance>,
}

impl TilePlan {
    /// Resolves the tile rectangle, pixel span and ground sample distance.
    pub fn new(bbox: &BoundingBox, zoom: u8, gsd_mode: GsdMode) -> Result<Self, CoordError> {
        let rect = BoundingTileRect::resolve(bbox, zoom)?;

        let origin = pixel_coord(bbox.corner0.lon, bbox.corner0.lat, zoom);
        let far = pixel_coord(bbox.corner1.lon, bbox.corner1.lat, zoom);
        let span = PixelPoint {
            x: far.x - origin.x,
            y: origin.y - far.y,
        };

        let gsd = match ground_sample_distance(&bbox.corner0, &bbox.corner1, span, gsd_mode) {
            Ok(gsd) => Some(gsd),
            Err(e) => {
                warn!(error = %e, "Ground sample distance unavailable");
                None
            }
        };

        debug!(
            zoom,
            min_x = rect.min_x.tile,
            max_x = rect.max_x.tile,
            min_y = rect.min_y.tile,
            max_y = rect.max_y.tile,
            tiles = rect.tile_count(),
            "Resolved tile range"
        );

        Ok(Self {
            bbox: *bbox,
            zoom,
            rect,
            span,
            gsd,
        })
    }
}
