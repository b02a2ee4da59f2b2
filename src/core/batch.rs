//! Gridded forward geolocation over a full radar acquisition

use ndarray::Array2;

use crate::core::basis::TcnBasis;
use crate::core::dem::ElevationSource;
use crate::core::doppler::DopplerModel;
use crate::core::ellipsoid::Ellipsoid;
use crate::core::geometry::{rdr2geo_pixel, Pixel, Rdr2GeoParams};
use crate::core::orbit::Orbit;
use crate::core::radar_grid::RadarGrid;
use crate::types::GeoResult;

/// Per-pixel geolocation layers for one radar grid
#[derive(Debug, Clone)]
pub struct TopoLayers {
    /// Longitude, radians
    pub longitude: Array2<f64>,
    /// Latitude, radians
    pub latitude: Array2<f64>,
    /// Height above the ellipsoid, meters
    pub height: Array2<f64>,
    /// 1 where the solver converged, 0 elsewhere
    pub converged: Array2<u8>,
}

impl TopoLayers {
    fn new(length: usize, width: usize) -> Self {
        Self {
            longitude: Array2::from_elem((length, width), f64::NAN),
            latitude: Array2::from_elem((length, width), f64::NAN),
            height: Array2::from_elem((length, width), f64::NAN),
            converged: Array2::zeros((length, width)),
        }
    }

    /// Number of pixels with a converged solution
    pub fn num_converged(&self) -> usize {
        self.converged.iter().filter(|&&c| c == 1).count()
    }
}

/// Geolocate every pixel of the radar grid against the elevation source.
///
/// Lines are independent and processed in parallel when the `parallel`
/// feature is enabled. Within a line the previous pixel's height warm
/// starts the next solve, so neighboring results may differ from an
/// isolated [`rdr2geo`](crate::core::geometry::rdr2geo) call by up to the
/// convergence threshold.
pub fn rdr2geo_grid(
    grid: &RadarGrid,
    orbit: &Orbit,
    ellipsoid: &Ellipsoid,
    dem: &dyn ElevationSource,
    doppler: &dyn DopplerModel,
    params: &Rdr2GeoParams,
) -> GeoResult<TopoLayers> {
    grid.validate()?;

    let start_time = std::time::Instant::now();
    log::info!(
        "Geolocating radar grid: {} lines x {} samples",
        grid.length,
        grid.width
    );

    let mut layers = TopoLayers::new(grid.length, grid.width);

    #[cfg(feature = "parallel")]
    let line_results: Vec<Vec<(f64, f64, f64, bool)>> = {
        use rayon::prelude::*;

        (0..grid.length)
            .into_par_iter()
            .map(|line| process_line(grid, orbit, ellipsoid, dem, doppler, params, line))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let line_results: Vec<Vec<(f64, f64, f64, bool)>> = (0..grid.length)
        .map(|line| process_line(grid, orbit, ellipsoid, dem, doppler, params, line))
        .collect();

    for (line, row) in line_results.into_iter().enumerate() {
        for (sample, (lon, lat, hgt, ok)) in row.into_iter().enumerate() {
            layers.longitude[[line, sample]] = lon;
            layers.latitude[[line, sample]] = lat;
            layers.height[[line, sample]] = hgt;
            layers.converged[[line, sample]] = ok as u8;
        }
    }

    log::info!(
        "Geolocation complete: {}/{} pixels converged in {:.2?}",
        layers.num_converged(),
        grid.size(),
        start_time.elapsed()
    );

    Ok(layers)
}

/// Solve one radar line. The platform state and basis are interpolated
/// once and shared across the line's samples.
fn process_line(
    grid: &RadarGrid,
    orbit: &Orbit,
    ellipsoid: &Ellipsoid,
    dem: &dyn ElevationSource,
    doppler: &dyn DopplerModel,
    params: &Rdr2GeoParams,
    line: usize,
) -> Vec<(f64, f64, f64, bool)> {
    let tline = grid.sensing_time(line as f64);
    let state = orbit.interpolate(tline);
    let basis = TcnBasis::new(&state.position, &state.velocity);
    let vmag = state.velocity.norm();

    let mut row = Vec::with_capacity(grid.width);
    let mut height_seed = f64::NAN;
    for sample in 0..grid.width {
        let rng = grid.slant_range(sample as f64);
        let dopfact = 0.5 * grid.wavelength * (doppler.evaluate(tline, rng) / vmag) * rng;
        let pixel = Pixel {
            range: rng,
            dopfact,
            bin: sample,
        };

        let result = rdr2geo_pixel(
            &pixel,
            &basis,
            &state,
            ellipsoid,
            dem,
            grid.look_side,
            params,
            height_seed,
        );

        let target = result.target;
        height_seed = if result.converged && target.height.is_finite() {
            target.height
        } else {
            f64::NAN
        };
        row.push((
            target.longitude,
            target.latitude,
            target.height,
            result.converged,
        ));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dem::ConstantDem;
    use crate::core::doppler::ConstantDoppler;
    use crate::core::geometry::rdr2geo;
    use crate::types::{LookSide, StateVector, Vec3};
    use chrono::{DateTime, Utc};

    fn create_test_orbit() -> Orbit {
        let epoch = "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let radius: f64 = 7_100_000.0;
        let gm = 3.986004418e14;
        let omega = (gm / radius.powi(3)).sqrt();

        let state_vectors = (0..=100)
            .map(|k| {
                let t = 10.0 * k as f64;
                let theta = omega * (t - 500.0);
                StateVector {
                    time: t,
                    position: Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0),
                    velocity: Vec3::new(
                        -radius * omega * theta.sin(),
                        radius * omega * theta.cos(),
                        0.0,
                    ),
                }
            })
            .collect();
        Orbit::new(epoch, state_vectors).unwrap()
    }

    fn create_test_grid() -> RadarGrid {
        RadarGrid {
            look_side: LookSide::Right,
            sensing_start: 490.0,
            wavelength: 0.0555,
            prf: 10.0,
            starting_range: 845_000.0,
            range_pixel_spacing: 2_000.0,
            length: 4,
            width: 6,
            az_looks: 1,
            rg_looks: 1,
            ref_epoch: "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn test_grid_matches_single_pixel_solutions() {
        let orbit = create_test_orbit();
        let ellipsoid = Ellipsoid::wgs84();
        let dem = ConstantDem(250.0);
        let doppler = ConstantDoppler(0.0);
        let grid = create_test_grid();
        let params = Rdr2GeoParams::default();

        let layers = rdr2geo_grid(&grid, &orbit, &ellipsoid, &dem, &doppler, &params).unwrap();
        assert_eq!(layers.num_converged(), grid.size());

        for line in 0..grid.length {
            for sample in 0..grid.width {
                let single = rdr2geo(
                    grid.sensing_time(line as f64),
                    grid.slant_range(sample as f64),
                    0.0,
                    &orbit,
                    &ellipsoid,
                    &dem,
                    grid.wavelength,
                    grid.look_side,
                    &params,
                    f64::NAN,
                );
                assert!(single.converged);
                // Warm starting may stop at a different iterate inside the
                // convergence ball
                approx::assert_abs_diff_eq!(
                    layers.longitude[[line, sample]],
                    single.target.longitude,
                    epsilon = 1e-7
                );
                approx::assert_abs_diff_eq!(
                    layers.latitude[[line, sample]],
                    single.target.latitude,
                    epsilon = 1e-7
                );
                approx::assert_abs_diff_eq!(
                    layers.height[[line, sample]],
                    single.target.height,
                    epsilon = 0.5
                );
            }
        }
    }

    #[test]
    fn test_grid_outside_orbit_yields_unconverged_nan() {
        let orbit = create_test_orbit();
        let ellipsoid = Ellipsoid::wgs84();
        let dem = ConstantDem(0.0);
        let doppler = ConstantDoppler(0.0);
        let mut grid = create_test_grid();
        grid.sensing_start = 2_000.0;

        let params = Rdr2GeoParams::default();
        let layers = rdr2geo_grid(&grid, &orbit, &ellipsoid, &dem, &doppler, &params).unwrap();
        assert_eq!(layers.num_converged(), 0);
        assert!(layers.longitude.iter().all(|v| v.is_nan()));
        assert!(layers.height.iter().all(|v| v.is_nan()));
    }
}
