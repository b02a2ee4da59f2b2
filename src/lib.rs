//! SARgeo: SAR geolocation solvers
//!
//! This library maps between the radar frame (azimuth time, slant range,
//! Doppler) and the geographic frame (longitude, latitude, height) for
//! spaceborne SAR: the forward `rdr2geo` solve, the inverse `geo2rdr` solve,
//! and a footprint estimator that bounds the illuminated ground area.

pub mod types;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, GeoError, GeoResult, GeoTransform, GeodeticPoint, LookSide,
    StateVector, Vec3,
};

pub use core::basis::TcnBasis;
pub use core::batch::{rdr2geo_grid, TopoLayers};
pub use core::dem::{ConstantDem, DemRaster, ElevationSource};
pub use core::doppler::{ConstantDoppler, DopplerGrid, DopplerModel, DopplerPolynomial};
pub use core::ellipsoid::Ellipsoid;
pub use core::footprint::compute_dem_bounds;
pub use core::geometry::{
    geo2rdr, rdr2geo, rdr2geo_cone, rdr2geo_pixel, Geo2RdrParams,
    Geo2RdrResult, Pixel, Rdr2GeoParams, Rdr2GeoResult, SolveDiagnostics,
};
pub use core::orbit::Orbit;
pub use core::radar_grid::RadarGrid;
