//! Radar acquisition grid metadata

use crate::types::{GeoError, GeoResult, LookSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Radar sampling grid of an acquisition
///
/// Maps image rows to azimuth sensing times and columns to slant ranges.
/// Look factors describe how many raw looks each row/column of this grid
/// spans (1 for single-look data); times are seconds relative to
/// `ref_epoch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarGrid {
    pub look_side: LookSide,
    pub sensing_start: f64,        // azimuth time of the first line, seconds
    pub wavelength: f64,           // radar wavelength, meters
    pub prf: f64,                  // pulse repetition frequency, Hz
    pub starting_range: f64,       // slant range of the first sample, meters
    pub range_pixel_spacing: f64,  // meters
    pub length: usize,             // number of lines (azimuth)
    pub width: usize,              // number of samples (range)
    pub az_looks: usize,           // azimuth looks per line
    pub rg_looks: usize,           // range looks per sample
    pub ref_epoch: DateTime<Utc>,
}

impl RadarGrid {
    /// Check that the grid describes a usable acquisition
    pub fn validate(&self) -> GeoResult<()> {
        if self.prf <= 0.0 || self.wavelength <= 0.0 || self.range_pixel_spacing <= 0.0 {
            return Err(GeoError::InvalidParameter(format!(
                "Radar grid needs positive prf/wavelength/spacing, got {}/{}/{}",
                self.prf, self.wavelength, self.range_pixel_spacing
            )));
        }
        if self.length == 0 || self.width == 0 {
            return Err(GeoError::InvalidParameter(format!(
                "Radar grid must not be empty, got {}x{}",
                self.length, self.width
            )));
        }
        if self.az_looks == 0 || self.rg_looks == 0 {
            return Err(GeoError::InvalidParameter(
                "Look factors must be at least 1".to_string(),
            ));
        }
        if !self.sensing_start.is_finite() || !self.starting_range.is_finite() {
            return Err(GeoError::InvalidParameter(
                "Radar grid timing must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Total number of grid elements
    pub fn size(&self) -> usize {
        self.length * self.width
    }

    /// Azimuth sensing time for a line (row), seconds since `ref_epoch`
    pub fn sensing_time(&self, line: f64) -> f64 {
        self.sensing_start + line * self.az_looks as f64 / self.prf
    }

    /// Slant range for a sample (column), meters
    pub fn slant_range(&self, sample: f64) -> f64 {
        self.starting_range + sample * self.rg_looks as f64 * self.range_pixel_spacing
    }

    /// Azimuth time of the last line
    pub fn sensing_stop(&self) -> f64 {
        self.sensing_time((self.length - 1) as f64)
    }

    /// Azimuth time at the middle of the acquisition
    pub fn sensing_mid(&self) -> f64 {
        0.5 * (self.sensing_start + self.sensing_stop())
    }

    /// Slant range of the last sample
    pub fn ending_range(&self) -> f64 {
        self.slant_range((self.width - 1) as f64)
    }

    /// Slant range at the middle of the swath
    pub fn mid_range(&self) -> f64 {
        0.5 * (self.starting_range + self.ending_range())
    }

    /// Copy of this grid with coarser look factors
    ///
    /// The grid dimensions shrink by the extra look factors; timing and
    /// range of the first element are unchanged.
    pub fn with_looks(&self, az_looks: usize, rg_looks: usize) -> GeoResult<Self> {
        if az_looks == 0 || rg_looks == 0 {
            return Err(GeoError::InvalidParameter(
                "Look factors must be at least 1".to_string(),
            ));
        }
        let mut grid = self.clone();
        grid.az_looks = self.az_looks * az_looks;
        grid.rg_looks = self.rg_looks * rg_looks;
        grid.length = self.length / az_looks;
        grid.width = self.width / rg_looks;
        grid.validate()?;
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn create_test_grid() -> RadarGrid {
        RadarGrid {
            look_side: LookSide::Right,
            sensing_start: 100.0,
            wavelength: 0.0555,
            prf: 1000.0,
            starting_range: 800_000.0,
            range_pixel_spacing: 10.0,
            length: 2001,
            width: 501,
            az_looks: 1,
            rg_looks: 1,
            ref_epoch: "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn test_line_and_sample_mapping() {
        let grid = create_test_grid();
        assert_abs_diff_eq!(grid.sensing_time(0.0), 100.0);
        assert_abs_diff_eq!(grid.sensing_time(500.0), 100.5);
        assert_abs_diff_eq!(grid.slant_range(0.0), 800_000.0);
        assert_abs_diff_eq!(grid.slant_range(250.0), 802_500.0);
    }

    #[test]
    fn test_derived_extents() {
        let grid = create_test_grid();
        assert_abs_diff_eq!(grid.sensing_stop(), 102.0);
        assert_abs_diff_eq!(grid.sensing_mid(), 101.0);
        assert_abs_diff_eq!(grid.ending_range(), 805_000.0);
        assert_abs_diff_eq!(grid.mid_range(), 802_500.0);
        assert_eq!(grid.size(), 2001 * 501);
    }

    #[test]
    fn test_with_looks() {
        let grid = create_test_grid().with_looks(2, 5).unwrap();
        assert_eq!(grid.az_looks, 2);
        assert_eq!(grid.rg_looks, 5);
        assert_eq!(grid.length, 1000);
        assert_eq!(grid.width, 100);
        // One multilooked line spans two raw PRF intervals
        assert_abs_diff_eq!(grid.sensing_time(1.0), 100.002);
        assert_abs_diff_eq!(grid.slant_range(1.0), 800_050.0);
        // Derived extents stay consistent with the look-aware mapping
        assert_abs_diff_eq!(grid.sensing_stop(), grid.sensing_time((grid.length - 1) as f64));
        assert_abs_diff_eq!(grid.sensing_stop(), 101.998);
        assert_abs_diff_eq!(grid.ending_range(), grid.slant_range((grid.width - 1) as f64));
        assert_abs_diff_eq!(grid.ending_range(), 804_950.0);

        assert!(create_test_grid().with_looks(0, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_grid() {
        let mut grid = create_test_grid();
        grid.prf = 0.0;
        assert!(grid.validate().is_err());

        let mut grid = create_test_grid();
        grid.width = 0;
        assert!(grid.validate().is_err());

        let mut grid = create_test_grid();
        grid.sensing_start = f64::NAN;
        assert!(grid.validate().is_err());
    }
}
