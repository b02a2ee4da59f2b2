//! Geocentric TCN basis construction

use crate::types::Vec3;

/// Orthonormal tangential/cross-track/nadir frame tied to an orbit state
///
/// Right-handed: `t x c = n`. The nadir axis points from the platform
/// toward the Earth center (geocentric, not geodetic, nadir).
#[derive(Debug, Clone, Copy)]
pub struct TcnBasis {
    pub t: Vec3,  // tangential (along-track) unit vector
    pub c: Vec3,  // cross-track unit vector
    pub n: Vec3,  // nadir unit vector
}

impl TcnBasis {
    /// Build the TCN frame from an ECEF position/velocity pair.
    ///
    /// Precondition: both vectors are nonzero and not parallel. A zero
    /// velocity yields NaN axes (no panic), which poisons any solve that
    /// consumes the basis.
    pub fn new(position: &Vec3, velocity: &Vec3) -> Self {
        let n = -position.normalize();
        let c = n.cross(velocity).normalize();
        let t = c.cross(&n).normalize();
        TcnBasis { t, c, n }
    }
}
