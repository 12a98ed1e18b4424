//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

/// Clamp latitude of the projection, used as the reference point of the
/// latitude transform. Also the valid latitude range.
pub const CLAMP_LAT: f64 = 85.05112878;
pub const MIN_LAT: f64 = -CLAMP_LAT;
pub const MAX_LAT: f64 = CLAMP_LAT;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels served by the GSI tile pyramid
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 18;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// An angle as given by the caller: either decimal degrees or a
/// degrees/minutes/seconds triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Angle {
    Decimal(f64),
    Dms {
        degrees: f64,
        minutes: f64,
        seconds: f64,
    },
}

impl Angle {
    /// Creates an angle from a degrees/minutes/seconds triple.
    pub fn dms(degrees: f64, minutes: f64, seconds: f64) -> Self {
        Angle::Dms {
            degrees,
            minutes,
            seconds,
        }
    }

    /// Converts the angle to decimal degrees.
    ///
    /// D/M/S triples become `degrees + minutes/60 + seconds/3600`. The sign of
    /// `degrees` is not propagated to the other terms.
    #[inline]
    pub fn to_degrees(&self) -> f64 {
        match *self {
            Angle::Decimal(deg) => deg,
            Angle::Dms {
                degrees,
                minutes,
                seconds,
            } => degrees + minutes / 60.0 + seconds / 3600.0,
        }
    }
}

impl From<f64> for Angle {
    fn from(deg: f64) -> Self {
        Angle::Decimal(deg)
    }
}

impl From<[f64; 3]> for Angle {
    fn from(dms: [f64; 3]) -> Self {
        Angle::dms(dms[0], dms[1], dms[2])
    }
}

impl FromStr for Angle {
    type Err = CoordError;

    /// Parses `"36.6394"`, `"35:40:0.0000006"` or `"35,40,6e-7"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || CoordError::InvalidAngle(s.to_string());

        let separator = if trimmed.contains(':') {
            Some(':')
        } else if trimmed.contains(',') {
            Some(',')
        } else {
            None
        };

        let Some(separator) = separator else {
            let deg = trimmed.parse::<f64>().map_err(|_| invalid())?;
            return if deg.is_finite() {
                Ok(Angle::Decimal(deg))
            } else {
                Err(invalid())
            };
        };

        let parts = trimmed
            .split(separator)
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        match parts.as_slice() {
            [d, m, s] if d.is_finite() && m.is_finite() && s.is_finite() => {
                Ok(Angle::dms(*d, *m, *s))
            }
            _ => Err(invalid()),
        }
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a coordinate from two angles of either notation.
    pub fn from_angles(lat: impl Into<Angle>, lon: impl Into<Angle>) -> Self {
        Self {
            lat: lat.into().to_degrees(),
            lon: lon.into().to_degrees(),
        }
    }

    /// Checks the coordinate against the projection's valid range.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(CoordError::InvalidLatitude(self.lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(CoordError::InvalidLongitude(self.lon));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.8}, {:.8})", self.lat, self.lon)
    }
}

/// Two corners of the requested area. Corner order is free; the tile range
/// resolver normalizes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub corner0: Coordinate,
    pub corner1: Coordinate,
}

impl BoundingBox {
    pub fn new(corner0: Coordinate, corner1: Coordinate) -> Self {
        Self { corner0, corner1 }
    }

    /// Builds a box from the argument order `(lat0, lat1, lon0, lon1)`.
    pub fn from_angles(
        lat0: impl Into<Angle>,
        lat1: impl Into<Angle>,
        lon0: impl Into<Angle>,
        lon1: impl Into<Angle>,
    ) -> Self {
        Self {
            corner0: Coordinate::from_angles(lat0, lon0),
            corner1: Coordinate::from_angles(lat1, lon1),
        }
    }

    /// Returns the box with its corners exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            corner0: self.corner1,
            corner1: self.corner0,
        }
    }
}

/// Integer position in the global pyramid pixel space at one zoom level.
///
/// `x` grows eastward, `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

/// Real-world distance covered by one output pixel, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSampleDistance {
    pub x_meters_per_pixel: f64,
    pub y_meters_per_pixel: f64,
}

impl fmt::Display for GroundSampleDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4} m/px × {:.4} m/px",
            self.x_meters_per_pixel, self.y_meters_per_pixel
        )
    }
}

/// How the y-axis ground distance is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GsdMode {
    /// Meridian arc between the two corner latitudes; the longitude delta is
    /// ignored. This is the default.
    #[default]
    Compatible,
    /// Full great-circle distance between the two corners.
    Corrected,
}

impl FromStr for GsdMode {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compatible" => Ok(GsdMode::Compatible),
            "corrected" => Ok(GsdMode::Corrected),
            other => Err(CoordError::InvalidGsdMode(other.to_string())),
        }
    }
}

impl fmt::Display for GsdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GsdMode::Compatible => write!(f, "compatible"),
            GsdMode::Corrected => write!(f, "corrected"),
        }
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside the clamp range
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 18)
    InvalidZoom(u8),
    /// Text could not be read as decimal degrees or D/M/S
    InvalidAngle(String),
    /// Unknown ground sample distance mode
    InvalidGsdMode(String),
    /// Both corners project to the same pixel column or row
    DegenerateSpan { axis: char },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidAngle(text) => write!(
                f,
                "Invalid angle '{}': expected decimal degrees or D:M:S",
                text
            ),
            CoordError::InvalidGsdMode(mode) => write!(
                f,
                "Invalid GSD mode '{}': expected 'compatible' or 'corrected'",
                mode
            ),
            CoordError::DegenerateSpan { axis } => write!(
                f,
                "Bounding box has zero pixel extent along the {} axis",
                axis
            ),
        }
    }
}

impl std::error::Error for CoordError {}
