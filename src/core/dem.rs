//! Elevation sources used as the ground constraint of the forward solver

use crate::types::{GeoError, GeoResult, GeoTransform};
use ndarray::Array2;

/// Ground height lookup at geographic coordinates
///
/// Implementations define their own edge/extrapolation policy and must be
/// in-memory and `Sync` so a batch of solves can share one source.
pub trait ElevationSource: Sync {
    /// Height in meters above the ellipsoid at (lon, lat) in radians
    fn height_at(&self, lon: f64, lat: f64) -> f64;
}

/// Constant-height stand-in for a DEM
#[derive(Debug, Clone, Copy)]
pub struct ConstantDem(pub f64);

impl ElevationSource for ConstantDem {
    fn height_at(&self, _lon: f64, _lat: f64) -> f64 {
        self.0
    }
}

/// In-memory DEM raster on a north-up geographic grid
///
/// The geotransform is in degrees (GDAL convention, negative pixel height
/// for north-up data). Queries outside the raster clamp to the border
/// pixels.
#[derive(Debug, Clone)]
pub struct DemRaster {
    data: Array2<f32>,
    transform: GeoTransform,
}

impl DemRaster {
    pub fn new(data: Array2<f32>, transform: GeoTransform) -> GeoResult<Self> {
        if data.is_empty() {
            return Err(GeoError::InvalidParameter(
                "DEM raster must not be empty".to_string(),
            ));
        }
        if transform.pixel_width == 0.0 || transform.pixel_height == 0.0 {
            return Err(GeoError::InvalidParameter(
                "DEM pixel size must be nonzero".to_string(),
            ));
        }
        if transform.rotation_x != 0.0 || transform.rotation_y != 0.0 {
            return Err(GeoError::InvalidParameter(
                "Rotated DEM rasters are not supported".to_string(),
            ));
        }
        Ok(DemRaster { data, transform })
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Bilinear sample at fractional (row, col), clamped to the border
    fn sample(&self, row: f64, col: f64) -> f64 {
        let max_row = (self.data.nrows() - 1) as f64;
        let max_col = (self.data.ncols() - 1) as f64;
        let row = row.clamp(0.0, max_row);
        let col = col.clamp(0.0, max_col);

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = std::cmp::min(r0 + 1, self.data.nrows() - 1);
        let c1 = std::cmp::min(c0 + 1, self.data.ncols() - 1);
        let dr = row - r0 as f64;
        let dc = col - c0 as f64;

        let v0 = self.data[[r0, c0]] as f64 * (1.0 - dc) + self.data[[r0, c1]] as f64 * dc;
        let v1 = self.data[[r1, c0]] as f64 * (1.0 - dc) + self.data[[r1, c1]] as f64 * dc;
        v0 * (1.0 - dr) + v1 * dr
    }
}

impl ElevationSource for DemRaster {
    fn height_at(&self, lon: f64, lat: f64) -> f64 {
        let col = (lon.to_degrees() - self.transform.top_left_x) / self.transform.pixel_width;
        let row = (lat.to_degrees() - self.transform.top_left_y) / self.transform.pixel_height;
        self.sample(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn create_test_raster() -> DemRaster {
        // 2x2 degree tile, 1 degree pixels, north-up from 48N/10E
        let data = array![[100.0_f32, 200.0], [300.0, 400.0]];
        let transform = GeoTransform {
            top_left_x: 10.0,
            pixel_width: 1.0,
            rotation_x: 0.0,
            top_left_y: 48.0,
            rotation_y: 0.0,
            pixel_height: -1.0,
        };
        DemRaster::new(data, transform).unwrap()
    }

    #[test]
    fn test_constant_dem() {
        let dem = ConstantDem(42.0);
        assert_eq!(dem.height_at(0.1, -0.5), 42.0);
    }

    #[test]
    fn test_raster_nodes_and_center() {
        let dem = create_test_raster();
        let lon0 = 10.0_f64.to_radians();
        let lat0 = 48.0_f64.to_radians();
        assert_abs_diff_eq!(dem.height_at(lon0, lat0), 100.0, epsilon = 1e-9);

        let lon_mid = 10.5_f64.to_radians();
        let lat_mid = 47.5_f64.to_radians();
        assert_abs_diff_eq!(dem.height_at(lon_mid, lat_mid), 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_raster_clamps_outside() {
        let dem = create_test_raster();
        let lon = 20.0_f64.to_radians();
        let lat = 10.0_f64.to_radians();
        assert_abs_diff_eq!(dem.height_at(lon, lat), 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_raster_rejects_bad_input() {
        let transform = GeoTransform {
            top_left_x: 0.0,
            pixel_width: 1.0,
            rotation_x: 0.0,
            top_left_y: 0.0,
            rotation_y: 0.0,
            pixel_height: -1.0,
        };
        assert!(DemRaster::new(Array2::zeros((0, 0)), transform).is_err());

        let rotated = GeoTransform {
            rotation_x: 0.1,
            ..transform
        };
        assert!(DemRaster::new(Array2::zeros((2, 2)), rotated).is_err());
    }
}
