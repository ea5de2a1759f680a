use geo::algorithm::contains::Contains;
use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// WGS84 point. Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// A usable coordinate is finite, in range, and not the (0, 0) placeholder
    /// that unmigrated therapist records carry.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
            && !(self.lat == 0.0 && self.lng == 0.0)
    }
}

/// One entry of a therapist's travel-feasibility profile. A schedule may cap
/// travel by distance, by duration, or both; either limit alone is a complete
/// constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TravelConstraint {
    pub distance_meters: Option<u32>,
    pub duration_seconds: Option<u32>,
}

impl TravelConstraint {
    pub fn distance(meters: u32) -> Self {
        Self {
            distance_meters: Some(meters),
            duration_seconds: None,
        }
    }

    pub fn duration(seconds: u32) -> Self {
        Self {
            distance_meters: None,
            duration_seconds: Some(seconds),
        }
    }

    /// True when the entry carries no usable limit (absent or zero values).
    pub fn is_empty(&self) -> bool {
        !matches!(self.distance_meters, Some(v) if v > 0)
            && !matches!(self.duration_seconds, Some(v) if v > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Distance,
    Duration,
}

/// A reachable-region polygon returned by the routing provider for one
/// distance or duration limit around an origin point.
#[derive(Debug, Clone)]
pub struct ReachableRegion {
    pub kind: RangeKind,
    pub limit: u32,
    polygon: Polygon<f64>,
}

impl ReachableRegion {
    /// Builds a region from an outer ring of coordinates. The ring does not
    /// need to be explicitly closed.
    pub fn from_ring(kind: RangeKind, limit: u32, ring: Vec<Coordinate>) -> Self {
        let exterior: Vec<Coord<f64>> = ring
            .into_iter()
            .map(|c| Coord { x: c.lng, y: c.lat })
            .collect();

        Self {
            kind,
            limit,
            polygon: Polygon::new(LineString::from(exterior), vec![]),
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        self.polygon.contains(&Point::new(point.lng, point.lat))
    }
}

#[derive(Error, Debug)]
pub enum GeoRoutingError {
    #[error("Geo routing provider is not configured")]
    NotConfigured,

    #[error("Isoline request timed out")]
    Timeout,

    #[error("Isoline provider error ({status}): {message}")]
    ProviderStatus { status: u16, message: String },

    #[error("Invalid isoline response: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GeoRoutingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoRoutingError::Timeout
        } else {
            GeoRoutingError::Transport(err.to_string())
        }
    }
}
