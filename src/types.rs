use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// ECEF 3-vector (positions in meters, velocities in m/s)
pub type Vec3 = Vector3<f64>;

/// Antenna pointing side relative to the flight direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookSide {
    Left,
    Right,
}

impl LookSide {
    /// Sign convention used by the geometry solvers: Left = +1, Right = -1
    pub fn sign(self) -> f64 {
        match self {
            LookSide::Left => 1.0,
            LookSide::Right => -1.0,
        }
    }
}

impl std::fmt::Display for LookSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookSide::Left => write!(f, "left"),
            LookSide::Right => write!(f, "right"),
        }
    }
}

impl std::str::FromStr for LookSide {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(LookSide::Left),
            "right" => Ok(LookSide::Right),
            _ => Err(GeoError::InvalidParameter(format!(
                "unknown look side: {}",
                s
            ))),
        }
    }
}

/// Orbit state vector
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateVector {
    pub time: f64,       // seconds since the orbit reference epoch
    pub position: Vec3,  // [x, y, z] in meters (ECEF)
    pub velocity: Vec3,  // [vx, vy, vz] in m/s (ECEF)
}

/// Geodetic coordinates on a reference ellipsoid
///
/// Height may be NaN on input to the forward solver, meaning "no prior
/// estimate"; the solver then seeds its own height.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub longitude: f64,  // radians
    pub latitude: f64,   // radians
    pub height: f64,     // meters above the ellipsoid
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// Geospatial transformation parameters (GDAL-style affine)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

/// Error types for geolocation
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("Orbit error: {0}")]
    Orbit(String),

    #[error("Look side mismatch: requested {requested} but the geometry points the other way")]
    LookSideMismatch { requested: LookSide },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for geolocation operations
pub type GeoResult<T> = Result<T, GeoError>;
