//! Reference ellipsoid and exact geodetic/ECEF conversion

use crate::types::{GeodeticPoint, Vec3};
use serde::{Deserialize, Serialize};

/// Reference ellipsoid described by semi-major axis and squared eccentricity
///
/// Both coordinate conversions are closed-form; the ECEF to geodetic
/// direction uses the non-iterative method of Vermeille (2002).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub a: f64,   // semi-major axis, meters
    pub e2: f64,  // first eccentricity squared
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid::wgs84()
    }
}

impl Ellipsoid {
    pub fn new(a: f64, e2: f64) -> Self {
        Ellipsoid { a, e2 }
    }

    /// WGS84 parameters
    pub fn wgs84() -> Self {
        Ellipsoid {
            a: 6378137.0,
            e2: 0.0066943799901,
        }
    }

    /// Semi-minor axis, meters
    pub fn b(&self) -> f64 {
        self.a * (1.0 - self.e2).sqrt()
    }

    /// Geodetic (lon, lat, height) to ECEF (x, y, z)
    pub fn lon_lat_to_xyz(&self, llh: &GeodeticPoint) -> Vec3 {
        // Prime vertical radius of curvature
        let re = self.a / (1.0 - self.e2 * llh.latitude.sin().powi(2)).sqrt();
        Vec3::new(
            (re + llh.height) * llh.latitude.cos() * llh.longitude.cos(),
            (re + llh.height) * llh.latitude.cos() * llh.longitude.sin(),
            (re * (1.0 - self.e2) + llh.height) * llh.latitude.sin(),
        )
    }

    /// ECEF (x, y, z) to geodetic (lon, lat, height), Vermeille (2002)
    pub fn xyz_to_lon_lat(&self, xyz: &Vec3) -> GeodeticPoint {
        // Lateral distance normalized by the major axis
        let p = (xyz[0].powi(2) + xyz[1].powi(2)) / self.a.powi(2);
        // Polar distance normalized by the major axis
        let q = (1.0 - self.e2) * xyz[2].powi(2) / self.a.powi(2);
        let r = (p + q - self.e2.powi(2)) / 6.0;
        let s = self.e2.powi(2) * p * q / (4.0 * r.powi(3));
        let t = (1.0 + s + (s * (2.0 + s)).sqrt()).cbrt();
        let u = r * (1.0 + t + 1.0 / t);
        let rv = (u.powi(2) + self.e2.powi(2) * q).sqrt();
        let w = self.e2 * (u + rv - q) / (2.0 * rv);
        let k = (u + rv + w.powi(2)).sqrt() - w;
        // Radial distance from the polar axis
        let d = k * (xyz[0].powi(2) + xyz[1].powi(2)).sqrt() / (k + self.e2);
        GeodeticPoint {
            longitude: xyz[1].atan2(xyz[0]),
            latitude: xyz[2].atan2(d),
            height: (k + self.e2 - 1.0) * (d.powi(2) + xyz[2].powi(2)).sqrt() / k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_wgs84_constants() {
        let ell = Ellipsoid::default();
        assert_eq!(ell.a, 6378137.0);
        assert_relative_eq!(ell.b(), 6356752.314, epsilon = 1e-3);
    }

    #[test]
    fn test_equator_point() {
        let ell = Ellipsoid::wgs84();
        let llh = GeodeticPoint {
            longitude: 0.0,
            latitude: 0.0,
            height: 0.0,
        };
        let xyz = ell.lon_lat_to_xyz(&llh);
        assert_abs_diff_eq!(xyz[0], ell.a, epsilon = 1e-6);
        assert_abs_diff_eq!(xyz[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(xyz[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pole_point() {
        let ell = Ellipsoid::wgs84();
        let llh = GeodeticPoint {
            longitude: 0.3,
            latitude: std::f64::consts::FRAC_PI_2,
            height: 100.0,
        };
        let xyz = ell.lon_lat_to_xyz(&llh);
        assert_abs_diff_eq!(xyz[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(xyz[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(xyz[2], ell.b() + 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let ell = Ellipsoid::wgs84();
        let cases = [
            (0.2510, 0.7905, 642.0),
            (-1.9513, -0.3141, 3201.5),
            (2.9845, 1.2217, -55.0),
            (0.0, -0.8727, 0.0),
        ];
        for &(lon, lat, height) in &cases {
            let llh = GeodeticPoint {
                longitude: lon,
                latitude: lat,
                height,
            };
            let back = ell.xyz_to_lon_lat(&ell.lon_lat_to_xyz(&llh));
            assert_abs_diff_eq!(back.longitude, lon, epsilon = 1e-11);
            assert_abs_diff_eq!(back.latitude, lat, epsilon = 1e-11);
            assert_abs_diff_eq!(back.height, height, epsilon = 1e-6);
        }
    }
}
