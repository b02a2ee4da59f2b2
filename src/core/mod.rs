//! Core geolocation modules

pub mod basis;
pub mod batch;
pub mod dem;
pub mod doppler;
pub mod ellipsoid;
pub mod footprint;
pub mod geometry;
pub mod orbit;
pub mod radar_grid;

// Re-export main types
pub use basis::TcnBasis;
pub use batch::{rdr2geo_grid, TopoLayers};
pub use dem::{ConstantDem, DemRaster, ElevationSource};
pub use doppler::{ConstantDoppler, DopplerGrid, DopplerModel, DopplerPolynomial};
pub use ellipsoid::Ellipsoid;
pub use footprint::compute_dem_bounds;
pub use geometry::{
    geo2rdr, rdr2geo, rdr2geo_cone, rdr2geo_pixel, Geo2RdrParams,
    Geo2RdrResult, Pixel, Rdr2GeoParams, Rdr2GeoResult, SolveDiagnostics,
};
pub use orbit::Orbit;
pub use radar_grid::RadarGrid;
