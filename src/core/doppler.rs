//! Doppler centroid models

use crate::types::{GeoError, GeoResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Doppler centroid as a function of azimuth time and slant range
///
/// Solvers evaluate this on every Newton step, so implementations should
/// be cheap, and `Sync` so one model can serve a parallel batch.
pub trait DopplerModel: Sync {
    /// Doppler centroid in Hz at (azimuth time in s, slant range in m)
    fn evaluate(&self, aztime: f64, slant_range: f64) -> f64;
}

/// Fixed Doppler centroid; zero-Doppler processing uses 0.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstantDoppler(pub f64);

impl DopplerModel for ConstantDoppler {
    fn evaluate(&self, _aztime: f64, _slant_range: f64) -> f64 {
        self.0
    }
}

/// 2-D polynomial Doppler model over normalized (azimuth, range)
///
/// `coeffs[[i, j]]` multiplies `((t - azimuth_mean)/azimuth_norm)^i *
/// ((r - range_mean)/range_norm)^j`, the annotation convention of most
/// SAR products.
#[derive(Debug, Clone)]
pub struct DopplerPolynomial {
    coeffs: Array2<f64>,
    azimuth_mean: f64,
    azimuth_norm: f64,
    range_mean: f64,
    range_norm: f64,
}

impl DopplerPolynomial {
    pub fn new(
        coeffs: Array2<f64>,
        azimuth_mean: f64,
        azimuth_norm: f64,
        range_mean: f64,
        range_norm: f64,
    ) -> GeoResult<Self> {
        if coeffs.is_empty() {
            return Err(GeoError::InvalidParameter(
                "Doppler polynomial needs at least one coefficient".to_string(),
            ));
        }
        if azimuth_norm == 0.0 || range_norm == 0.0 {
            return Err(GeoError::InvalidParameter(
                "Doppler polynomial normalization must be nonzero".to_string(),
            ));
        }
        Ok(DopplerPolynomial {
            coeffs,
            azimuth_mean,
            azimuth_norm,
            range_mean,
            range_norm,
        })
    }
}

impl DopplerModel for DopplerPolynomial {
    fn evaluate(&self, aztime: f64, slant_range: f64) -> f64 {
        let yval = (aztime - self.azimuth_mean) / self.azimuth_norm;
        let xval = (slant_range - self.range_mean) / self.range_norm;

        let mut val = 0.0;
        let mut scaley = 1.0;
        for i in 0..self.coeffs.nrows() {
            let mut scalex = 1.0;
            for j in 0..self.coeffs.ncols() {
                val += scalex * scaley * self.coeffs[[i, j]];
                scalex *= xval;
            }
            scaley *= yval;
        }
        val
    }
}

/// Tabulated Doppler surface on a regular (azimuth time, slant range) grid
///
/// Bilinear interpolation; queries outside the grid clamp to the border
/// samples rather than extrapolating.
#[derive(Debug, Clone)]
pub struct DopplerGrid {
    data: Array2<f64>,     // rows = azimuth samples, cols = range samples
    azimuth_start: f64,    // s
    azimuth_spacing: f64,  // s
    range_start: f64,      // m
    range_spacing: f64,    // m
}

impl DopplerGrid {
    pub fn new(
        data: Array2<f64>,
        azimuth_start: f64,
        azimuth_spacing: f64,
        range_start: f64,
        range_spacing: f64,
    ) -> GeoResult<Self> {
        if data.nrows() < 2 || data.ncols() < 2 {
            return Err(GeoError::InvalidParameter(format!(
                "Doppler grid needs at least 2x2 samples, got {}x{}",
                data.nrows(),
                data.ncols()
            )));
        }
        if azimuth_spacing <= 0.0 || range_spacing <= 0.0 {
            return Err(GeoError::InvalidParameter(
                "Doppler grid spacing must be positive".to_string(),
            ));
        }
        Ok(DopplerGrid {
            data,
            azimuth_start,
            azimuth_spacing,
            range_start,
            range_spacing,
        })
    }
}

impl DopplerModel for DopplerGrid {
    fn evaluate(&self, aztime: f64, slant_range: f64) -> f64 {
        let max_row = (self.data.nrows() - 1) as f64;
        let max_col = (self.data.ncols() - 1) as f64;
        let y = ((aztime - self.azimuth_start) / self.azimuth_spacing).clamp(0.0, max_row);
        let x = ((slant_range - self.range_start) / self.range_spacing).clamp(0.0, max_col);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = std::cmp::min(y0 + 1, self.data.nrows() - 1);
        let x1 = std::cmp::min(x0 + 1, self.data.ncols() - 1);
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let v0 = self.data[[y0, x0]] * (1.0 - dx) + self.data[[y0, x1]] * dx;
        let v1 = self.data[[y1, x0]] * (1.0 - dx) + self.data[[y1, x1]] * dx;
        v0 * (1.0 - dy) + v1 * dy
    }
}
