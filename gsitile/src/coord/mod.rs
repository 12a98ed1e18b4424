//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the pixel/tile coordinates of the GSI Web Mercator tile pyramid.
//!
//! At zoom `z` the pyramid is `2^(z+8)` pixels wide and tall, split into
//! 256×256 pixel tiles. Pixel `x` grows eastward and pixel `y` grows southward.

mod distance;
mod types;

pub use distance::{ground_sample_distance, great_circle_distance, EARTH_RADIUS_KM};
pub use types::{
    Angle, BoundingBox, CoordError, Coordinate, GroundSampleDistance, GsdMode, PixelPoint,
    CLAMP_LAT, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Half the pyramid width in pixels, `2^(zoom+7)`.
#[inline]
fn half_extent(zoom: u8) -> f64 {
    2.0_f64.powi(zoom as i32 + 7)
}

/// Latitude transform term `atanh(sin(lat))`.
#[inline]
fn mercator_term(lat_deg: f64) -> f64 {
    lat_deg.to_radians().sin().atanh()
}

/// Checks that a zoom level is served by the pyramid.
pub fn validate_zoom(zoom: u8) -> Result<(), CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    Ok(())
}

/// Continuous pixel x for a longitude.
#[inline]
pub fn longitude_to_pixel(lon: f64, zoom: u8) -> f64 {
    half_extent(zoom) * (lon / 180.0 + 1.0)
}

/// Continuous pixel y for a latitude, measured southward from the clamp
/// latitude.
#[inline]
pub fn latitude_to_pixel(lat: f64, zoom: u8) -> f64 {
    half_extent(zoom) / PI * (mercator_term(CLAMP_LAT) - mercator_term(lat))
}

/// Converts geographic coordinates to unrounded pyramid pixel coordinates.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `zoom` - Zoom level
///
/// # Returns
///
/// `(x, y)` as floating point pixel positions.
#[inline]
pub fn continuous_pixel(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    (longitude_to_pixel(lon, zoom), latitude_to_pixel(lat, zoom))
}

/// Converts geographic coordinates to integer pyramid pixel coordinates.
///
/// Both axes are rounded to the nearest integer, not truncated.
#[inline]
pub fn pixel_coord(lon: f64, lat: f64, zoom: u8) -> PixelPoint {
    let (x, y) = continuous_pixel(lon, lat, zoom);
    PixelPoint {
        x: x.round() as i64,
        y: y.round() as i64,
    }
}

/// Splits a continuous pixel value into a tile index and the pixel offset
/// inside that tile.
///
/// The offset is `pixel mod 256 + 0.5` truncated to an integer, so it lies in
/// `0..=256`. Pass the unrounded value from [`continuous_pixel`].
#[inline]
pub fn tile_index_and_remainder(pixel: f64) -> (u32, u32) {
    let size = TILE_SIZE as f64;
    let tile = (pixel / size) as u32;
    let remainder = (pixel.rem_euclid(size) + 0.5) as u32;
    (tile, remainder)
}

/// Converts a continuous pixel position back to `(lon, lat)` in degrees.
///
/// This is the inverse of [`continuous_pixel`].
#[inline]
pub fn pixel_to_lon_lat(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let half = half_extent(zoom);
    let lon = (x / half - 1.0) * 180.0;
    let term = mercator_term(CLAMP_LAT) - y * PI / half;
    let lat = term.tanh().asin().to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pixel_coord_at_origin_zoom_0() {
        // Null island sits in the middle of the single zoom-0 tile
        let point = pixel_coord(0.0, 0.0, 0);
        assert_eq!(point, PixelPoint { x: 128, y: 128 });
    }

    #[test]
    fn test_pixel_coord_at_clamp_latitudes() {
        assert_eq!(pixel_coord(-180.0, CLAMP_LAT, 0), PixelPoint { x: 0, y: 0 });
        assert_eq!(
            pixel_coord(180.0, -CLAMP_LAT, 0),
            PixelPoint { x: 256, y: 256 }
        );
    }

    #[test]
    fn test_pixel_coord_rounds_rather_than_truncates() {
        // x = 59312621.2766, y = 26204755.8548 at zoom 18
        let point = pixel_coord(138.1776949697821, 36.639413033456435, 18);
        assert_eq!(point.x, 59312621);
        assert_eq!(point.y, 26204756);
    }

    #[test]
    fn test_tile_index_and_remainder_new_york_zoom_16() {
        let (x, y) = continuous_pixel(-74.0060, 40.7128, 16);

        assert_eq!(tile_index_and_remainder(x), (19295, 158));
        assert_eq!(tile_index_and_remainder(y), (24640, 71));
    }

    #[test]
    fn test_remainder_bias_can_reach_tile_size() {
        // 255.6 + 0.5 truncates to 256
        assert_eq!(tile_index_and_remainder(255.6), (0, 256));
        assert_eq!(tile_index_and_remainder(255.4), (0, 255));
        assert_eq!(tile_index_and_remainder(256.0), (1, 0));
    }

    #[test]
    fn test_validate_zoom() {
        assert!(validate_zoom(0).is_ok());
        assert!(validate_zoom(MAX_ZOOM).is_ok());
        assert_eq!(validate_zoom(19), Err(CoordError::InvalidZoom(19)));
    }

    #[test]
    fn test_pixel_to_lon_lat_inverts_projection() {
        let (lon, lat) = (138.1776949697821, 36.639413033456435);
        let (x, y) = continuous_pixel(lon, lat, 18);
        let (lon2, lat2) = pixel_to_lon_lat(x, y, 18);

        assert!((lon - lon2).abs() < 1e-9, "lon {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
    }

    #[test]
    fn test_pixel_to_lon_lat_northwest_corner() {
        let (lon, lat) = pixel_to_lon_lat(0.0, 0.0, 10);
        assert!((lon + 180.0).abs() < 1e-9);
        assert!((lat - CLAMP_LAT).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_x_is_monotonic_in_longitude(
            zoom in 0u8..=MAX_ZOOM,
            a in -180.0f64..=180.0,
            b in -180.0f64..=180.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pixel_coord(lo, 0.0, zoom).x <= pixel_coord(hi, 0.0, zoom).x);
        }

        #[test]
        fn prop_y_grows_southward(
            zoom in 0u8..=MAX_ZOOM,
            a in MIN_LAT..=MAX_LAT,
            b in MIN_LAT..=MAX_LAT,
        ) {
            let (south, north) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(pixel_coord(0.0, south, zoom).y >= pixel_coord(0.0, north, zoom).y);
        }

        #[test]
        fn prop_remainder_reconstructs_pixel(pixel in 0.0f64..67_108_864.0) {
            let (tile, remainder) = tile_index_and_remainder(pixel);
            let within = pixel.rem_euclid(TILE_SIZE as f64);

            prop_assert!((remainder as f64) < 256.5);
            prop_assert_eq!(tile as f64, (pixel / 256.0).floor());
            // remainder - 0.5 is the truncated offset, at most one pixel below
            prop_assert!((remainder as f64 - 0.5) <= within + 1e-9);
            prop_assert!(within - (remainder as f64 - 0.5) <= 1.0);
        }
    }
}
