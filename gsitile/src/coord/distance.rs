//! Ground distance helpers.

use super::types::{Coordinate, CoordError, GroundSampleDistance, GsdMode, PixelPoint};

/// Equatorial Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Great-circle distance in metres between two positions, using the
/// spherical law of cosines.
pub fn great_circle_distance(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let y0 = lat0.to_radians();
    let y1 = lat1.to_radians();
    let dx = (lon1 - lon0).to_radians();

    let s = y0.sin() * y1.sin();
    let c = y0.cos() * y1.cos() * dx.cos();
    // Rounding can push the sum just outside acos's domain for nearby points
    let central_angle = (s + c).clamp(-1.0, 1.0).acos();

    EARTH_RADIUS_KM * central_angle * 1000.0
}

/// Computes the distance on the ground represented by one pixel.
///
/// # Arguments
///
/// * `corner0`, `corner1` - The requested corners in decimal degrees
/// * `span` - Pixel extent of the request: `(x1 - x0, y0 - y1)` of the two
///   corners' [`PixelPoint`]s. Only the magnitude is used.
/// * `mode` - How the y-axis distance is measured, see [`GsdMode`]
///
/// The x distance runs along `corner0`'s parallel from `corner0`'s longitude
/// to `corner1`'s longitude.
pub fn ground_sample_distance(
    corner0: &Coordinate,
    corner1: &Coordinate,
    span: PixelPoint,
    mode: GsdMode,
) -> Result<GroundSampleDistance, CoordError> {
    if span.x == 0 {
        return Err(CoordError::DegenerateSpan { axis: 'x' });
    }
    if span.y == 0 {
        return Err(CoordError::DegenerateSpan { axis: 'y' });
    }

    let x_distance = great_circle_distance(corner0.lat, corner0.lon, corner0.lat, corner1.lon);
    let y_distance = match mode {
        GsdMode::Compatible => {
            great_circle_distance(corner0.lat, corner0.lon, corner1.lat, corner0.lon)
        }
        GsdMode::Corrected => {
            great_circle_distance(corner0.lat, corner0.lon, corner1.lat, corner1.lon)
        }
    };

    Ok(GroundSampleDistance {
        x_meters_per_pixel: x_distance / span.x.unsigned_abs() as f64,
        y_meters_per_pixel: y_distance / span.y.unsigned_abs() as f64,
    })
}
