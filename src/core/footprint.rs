//! Ground footprint estimation for a radar acquisition

use crate::core::basis::TcnBasis;
use crate::core::dem::ConstantDem;
use crate::core::doppler::DopplerModel;
use crate::core::ellipsoid::Ellipsoid;
use crate::core::geometry::{rdr2geo_pixel, Pixel, Rdr2GeoParams};
use crate::core::orbit::Orbit;
use crate::core::radar_grid::RadarGrid;
use crate::types::{BoundingBox, GeoError, GeoResult, GeodeticPoint};

/// Assumed terrain extremes bracketing plausible relief, meters
const TEST_HEIGHTS: [f64; 2] = [-500.0, 1000.0];

/// Estimate the geographic bounding box of the ground area illuminated by
/// a sub-window of the radar grid.
///
/// The sub-window perimeter is traced at a coarse stride (about ten
/// samples per edge). Each perimeter sample is geolocated with a single
/// forward iteration against two constant test heights, bracketing the
/// terrain without needing an elevation source; a sample whose slant range
/// cannot reach the ground at a test height contributes the platform nadir
/// point instead. The accumulated bounds grow by `margin` (radians) on
/// every side.
pub fn compute_dem_bounds(
    orbit: &Orbit,
    ellipsoid: &Ellipsoid,
    doppler: &dyn DopplerModel,
    grid: &RadarGrid,
    x_off: usize,
    y_off: usize,
    x_size: usize,
    y_size: usize,
    margin: f64,
) -> GeoResult<BoundingBox> {
    grid.validate()?;
    if x_size == 0 || y_size == 0 {
        return Err(GeoError::InvalidParameter(
            "Footprint window must not be empty".to_string(),
        ));
    }
    if x_off + x_size > grid.width || y_off + y_size > grid.length {
        return Err(GeoError::InvalidParameter(format!(
            "Footprint window {}x{}+{}+{} exceeds the {}x{} radar grid",
            x_size, y_size, x_off, y_off, grid.width, grid.length
        )));
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(GeoError::InvalidParameter(format!(
            "Footprint margin must be finite and non-negative, got {}",
            margin
        )));
    }

    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;

    // Coarse strides, at least one grid cell per step
    let askip = std::cmp::max(y_size / 10, 1);
    let rskip = std::cmp::max(x_size / 10, 1);

    // Perimeter samples as (line, sample), walking top, right, bottom,
    // left edges
    let mut perimeter: Vec<(usize, usize)> = Vec::new();
    for j in (0..x_size).step_by(rskip) {
        perimeter.push((y_off, j + x_off));
    }
    for i in (0..y_size).step_by(askip) {
        perimeter.push((i + y_off, x_size + x_off));
    }
    for j in (1..=x_size).rev().step_by(rskip) {
        perimeter.push((y_off + y_size - 1, j + x_off));
    }
    for i in (1..=y_size).rev().step_by(askip) {
        perimeter.push((i + y_off, x_off));
    }

    // One forward iteration per sample is enough for bounds
    let single_iter = Rdr2GeoParams {
        threshold: 1.0e-5,
        max_iter: 1,
        extra_iter: 0,
    };

    for &(line, sample) in &perimeter {
        let tline = grid.sensing_time(line as f64);
        let state = orbit.interpolate(tline);

        let basis = TcnBasis::new(&state.position, &state.velocity);
        let sat_vmag = state.velocity.norm();
        let sat_llh = ellipsoid.xyz_to_lon_lat(&state.position);

        let rng = grid.slant_range(sample as f64);
        let dopfact = 0.5 * grid.wavelength * (doppler.evaluate(tline, rng) / sat_vmag) * rng;
        let pixel = Pixel {
            range: rng,
            dopfact,
            bin: sample,
        };

        // The previous solution carries over as the height seed
        let mut llh = GeodeticPoint {
            longitude: 0.0,
            latitude: 0.0,
            height: 0.0,
        };
        for &test_height in &TEST_HEIGHTS {
            if rng <= sat_llh.height - test_height + 1.0 {
                // Slant range cannot reach the ground here; take the
                // platform nadir point instead
                log::warn!(
                    "Possible near nadir imaging at line {}, sample {}",
                    line,
                    sample
                );
                llh = sat_llh;
            } else {
                let const_dem = ConstantDem(test_height);
                llh = rdr2geo_pixel(
                    &pixel,
                    &basis,
                    &state,
                    ellipsoid,
                    &const_dem,
                    grid.look_side,
                    &single_iter,
                    llh.height,
                )
                .target;
            }

            // NaN samples (orbit boundary violations) drop out of the
            // min/max accumulation
            min_lat = min_lat.min(llh.latitude);
            max_lat = max_lat.max(llh.latitude);
            min_lon = min_lon.min(llh.longitude);
            max_lon = max_lon.max(llh.longitude);
        }
    }

    if min_lon > max_lon || min_lat > max_lat {
        return Err(GeoError::Orbit(
            "No perimeter sample could be geolocated; radar grid timing does not overlap the orbit"
                .to_string(),
        ));
    }

    Ok(BoundingBox {
        min_lon: min_lon - margin,
        max_lon: max_lon + margin,
        min_lat: min_lat - margin,
        max_lat: max_lat + margin,
    })
}
