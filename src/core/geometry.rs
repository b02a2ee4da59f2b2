//! Radar/ground geometry solvers
//!
//! `rdr2geo` maps radar coordinates (azimuth time, slant range, Doppler) to
//! a ground point constrained by an elevation source; `geo2rdr` inverts the
//! mapping with a Newton iteration on the Doppler equation. Both write
//! best-effort outputs on non-convergence and keep the per-pixel path free
//! of panics.

use crate::core::basis::TcnBasis;
use crate::core::dem::ElevationSource;
use crate::core::doppler::DopplerModel;
use crate::core::ellipsoid::Ellipsoid;
use crate::core::orbit::Orbit;
use crate::types::{GeoError, GeoResult, GeodeticPoint, LookSide, StateVector, Vec3};
use serde::{Deserialize, Serialize};

/// Number of orbit samples tried when bootstrapping an azimuth time
const NUM_AZTIME_TEST: usize = 15;

/// One radar sample: slant range, Doppler factor, range-bin index
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pixel {
    pub range: f64,    // slant range, meters
    pub dopfact: f64,  // Doppler factor 0.5 * wavelength * f_D * range / |v|
    pub bin: usize,    // range-bin index
}

/// Convergence controls for the forward (radar to ground) solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rdr2GeoParams {
    /// Slant-range residual accepted as converged, meters
    pub threshold: f64,
    /// Primary iteration budget
    pub max_iter: usize,
    /// Additional damped iterations after the primary budget
    pub extra_iter: usize,
}

impl Default for Rdr2GeoParams {
    fn default() -> Self {
        Self {
            threshold: 0.05,  // meters
            max_iter: 25,
            extra_iter: 10,
        }
    }
}

/// Convergence controls for the inverse (ground to radar) solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Geo2RdrParams {
    /// Change in slant range accepted as converged, meters
    pub threshold: f64,
    /// Newton iteration budget
    pub max_iter: usize,
    /// Range step for the finite-difference Doppler slope, meters
    pub delta_range: f64,
}

impl Default for Geo2RdrParams {
    fn default() -> Self {
        Self {
            threshold: 1e-8,   // meters
            max_iter: 50,
            delta_range: 10.0, // meters
        }
    }
}

/// Advisory conditions observed during a forward solve
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// The requested azimuth time was outside the orbit span; all outputs
    /// are NaN
    pub orbit_out_of_bounds: bool,
    /// The iteration stopped because the slant range cannot reach below
    /// the platform at the current height estimate
    pub near_nadir: bool,
}

/// Outcome of a forward solve; the target is always populated, from a
/// best-effort height when `converged` is false
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rdr2GeoResult {
    pub target: GeodeticPoint,
    pub converged: bool,
    pub diagnostics: SolveDiagnostics,
}

/// Outcome of an inverse solve; azimuth time and slant range hold the last
/// iterate regardless of convergence
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Geo2RdrResult {
    pub azimuth_time: f64,  // seconds since the orbit reference epoch
    pub slant_range: f64,   // meters
    pub converged: bool,
}

/// Map radar coordinates to a ground point.
///
/// Interpolates the orbit at `aztime`, builds the TCN frame and the Doppler
/// factor, and runs the core iteration against `dem`. An azimuth time
/// outside the orbit span is not an error: the state vector interpolates to
/// NaN, which propagates through every output and is flagged in the
/// diagnostics.
///
/// `height_seed` primes the height iterate (pass NaN for no prior; the
/// solver then starts from the platform's footprint height).
pub fn rdr2geo(
    aztime: f64,
    slant_range: f64,
    doppler_hz: f64,
    orbit: &Orbit,
    ellipsoid: &Ellipsoid,
    dem: &dyn ElevationSource,
    wavelength: f64,
    side: LookSide,
    params: &Rdr2GeoParams,
    height_seed: f64,
) -> Rdr2GeoResult {
    let orbit_out_of_bounds = !orbit.contains(aztime);
    let state = orbit.interpolate(aztime);

    let basis = TcnBasis::new(&state.position, &state.velocity);
    let vmag = state.velocity.norm();
    let dopfact = 0.5 * wavelength * doppler_hz * slant_range / vmag;
    let pixel = Pixel {
        range: slant_range,
        dopfact,
        bin: 0,
    };

    let mut result = rdr2geo_pixel(
        &pixel,
        &basis,
        &state,
        ellipsoid,
        dem,
        side,
        params,
        height_seed,
    );
    result.diagnostics.orbit_out_of_bounds = orbit_out_of_bounds;
    result
}

/// Solve the range/Doppler/height system for the TCN offsets (alpha, beta,
/// gamma) of the look vector.
///
/// The law of cosines couples platform distance, target radius and slant
/// range; both square roots clamp their radicand at zero so degenerate
/// (near-nadir) geometry yields a zero offset instead of NaN.
fn tcn_offsets(
    pixel: &Pixel,
    sat_dist: f64,
    radius: f64,
    zrdr: f64,
    ndotv: f64,
    vdott: f64,
    side: LookSide,
) -> (f64, f64, f64) {
    let b = radius + zrdr;
    let costheta =
        0.5 * (sat_dist / pixel.range + pixel.range / sat_dist - (b / sat_dist) * (b / pixel.range));
    let sintheta = (1.0 - costheta * costheta).max(0.0).sqrt();

    let gamma = pixel.range * costheta;
    let alpha = (pixel.dopfact - gamma * ndotv) / vdott;
    let beta = -side.sign() * ((pixel.range * sintheta).powi(2) - alpha.powi(2)).max(0.0).sqrt();
    (alpha, beta, gamma)
}

/// Core forward iteration for a single pixel, given an already interpolated
/// platform state and its TCN frame.
///
/// Each pass solves for the TCN offsets at the current height estimate,
/// resamples the elevation source at the candidate ground point, and checks
/// the measured slant range against the pixel. Once the primary budget is
/// spent, subsequent passes damp limit cycling by averaging the previous
/// and current ECEF candidates. The returned point is recomputed once after
/// the loop so it lies exactly on the slant-range sphere whether or not the
/// height iteration converged.
pub fn rdr2geo_pixel(
    pixel: &Pixel,
    basis: &TcnBasis,
    state: &StateVector,
    ellipsoid: &Ellipsoid,
    dem: &dyn ElevationSource,
    side: LookSide,
    params: &Rdr2GeoParams,
    height_seed: f64,
) -> Rdr2GeoResult {
    let pos = &state.position;
    let vhat = state.velocity.normalize();

    let ndotv = basis.n.dot(&vhat);
    let vdott = vhat.dot(&basis.t);

    let major = ellipsoid.a;
    let minor = major * (1.0 - ellipsoid.e2).sqrt();

    // Geocentric radius and platform height over the surface point below
    // the platform
    let sat_dist = pos.norm();
    let eta = 1.0
        / ((pos[0] / major).powi(2) + (pos[1] / major).powi(2) + (pos[2] / minor).powi(2)).sqrt();
    let radius = eta * sat_dist;
    let sat_hgt = (1.0 - eta) * sat_dist;

    let mut target_llh = GeodeticPoint {
        longitude: 0.0,
        latitude: 0.0,
        height: if height_seed.is_nan() { sat_hgt } else { height_seed },
    };

    let mut converged = false;
    let mut near_nadir = false;
    let mut zrdr = target_llh.height;

    for i in 0..(params.max_iter + params.extra_iter) {
        // The echo cannot reach this far below nadir
        if sat_hgt - zrdr >= pixel.range {
            near_nadir = true;
            log::debug!(
                "Near nadir geometry: range {:.3} m within platform height {:.3} m",
                pixel.range,
                sat_hgt - zrdr
            );
            break;
        }

        let target_llh_old = target_llh;

        let (alpha, beta, gamma) = tcn_offsets(pixel, sat_dist, radius, zrdr, ndotv, vdott, side);

        // Candidate ground point and its geodetic coordinates
        let target_vec_guess = pos + alpha * basis.t + beta * basis.c + gamma * basis.n;
        target_llh = ellipsoid.xyz_to_lon_lat(&target_vec_guess);

        // Ground constraint: resample the elevation at the candidate
        target_llh.height = dem.height_at(target_llh.longitude, target_llh.latitude);

        // Back to ECEF with the interpolated height
        let target_vec_new = ellipsoid.lon_lat_to_xyz(&target_llh);
        zrdr = target_vec_new.norm() - radius;

        // Compare the measured slant range against the pixel
        let look_vec = pos - target_vec_new;
        let rdiff = pixel.range - look_vec.norm();
        if rdiff.abs() < params.threshold {
            converged = true;
            break;
        } else if i > params.max_iter {
            // Damp oscillation by averaging the previous and current ECEF
            // solutions, then re-derive the height iterate
            let target_vec_old = ellipsoid.lon_lat_to_xyz(&target_llh_old);
            let target_vec_avg = 0.5 * (target_vec_old + target_vec_new);
            target_llh = ellipsoid.xyz_to_lon_lat(&target_vec_avg);
            zrdr = target_vec_avg.norm() - radius;
        }
    }

    // Final pass with the last height iterate puts the output exactly on
    // the slant-range sphere, converged or not
    let (alpha, beta, gamma) = tcn_offsets(pixel, sat_dist, radius, zrdr, ndotv, vdott, side);
    let target_vec = pos + alpha * basis.t + beta * basis.c + gamma * basis.n;
    let target = ellipsoid.xyz_to_lon_lat(&target_vec);

    Rdr2GeoResult {
        target,
        converged,
        diagnostics: SolveDiagnostics {
            orbit_out_of_bounds: false,
            near_nadir,
        },
    }
}

/// Single-point variant of the forward solve without orbit context.
///
/// `axis` stands in for the velocity when building the TCN frame and
/// `angle` (the squint away from the plane normal to `axis`) replaces the
/// Doppler factor, so the solution lies on a cone around `axis`. Returns
/// the converged ECEF target, or None for a non-positive range or a
/// non-converged solve.
pub fn rdr2geo_cone(
    radar_xyz: &Vec3,
    axis: &Vec3,
    angle: f64,
    slant_range: f64,
    ellipsoid: &Ellipsoid,
    dem: &dyn ElevationSource,
    side: LookSide,
    params: &Rdr2GeoParams,
) -> Option<Vec3> {
    if slant_range <= 0.0 {
        return None;
    }

    let basis = TcnBasis::new(radar_xyz, axis);
    let pixel = Pixel {
        range: slant_range,
        dopfact: slant_range * angle.sin(),
        bin: 0,
    };
    let state = StateVector {
        time: 0.0,
        position: *radar_xyz,
        velocity: *axis,
    };

    let result = rdr2geo_pixel(&pixel, &basis, &state, ellipsoid, dem, side, params, 0.0);
    if result.converged {
        Some(ellipsoid.lon_lat_to_xyz(&result.target))
    } else {
        None
    }
}

/// Newton update for the azimuth time from the Doppler equation residual
///
/// `f(t) = dr . v - 0.5 * wavelength * f_D * r`; the Doppler range slope is
/// estimated by a forward difference over `delta_range`.
fn doppler_aztime_diff(
    dr: &Vec3,
    satvel: &Vec3,
    doppler: &dyn DopplerModel,
    wavelength: f64,
    aztime: f64,
    slant_range: f64,
    delta_range: f64,
) -> f64 {
    let dopfact = dr.dot(satvel);
    let fdop = doppler.evaluate(aztime, slant_range) * 0.5 * wavelength;
    let fdopder = (doppler.evaluate(aztime, slant_range + delta_range) * 0.5 * wavelength - fdop)
        / delta_range;

    let cost = dopfact - fdop * slant_range;
    let cost_der = -satvel.dot(satvel) + (fdop / slant_range + fdopder) * dopfact;
    cost / cost_der
}

/// Coarse grid search for an initial azimuth time.
///
/// Evaluates evenly spaced orbit samples, rejects the whole solve if the
/// first sample sits on the wrong look side, and keeps the in-bounds sample
/// with the smallest range to the target. Falls back to the orbit mid time
/// when no sample qualifies.
fn update_aztime(
    orbit: &Orbit,
    target_xyz: &Vec3,
    side: LookSide,
    range_bounds: Option<(f64, f64)>,
) -> GeoResult<f64> {
    let tstart = orbit.start_time();
    let tend = orbit.end_time();
    let delta_t = (tend - tstart) / (NUM_AZTIME_TEST - 1) as f64;

    let mut closest: Option<(f64, f64)> = None;  // (slant range, azimuth time)
    for k in 0..NUM_AZTIME_TEST {
        let aztime = tstart + k as f64 * delta_t;
        if !orbit.contains(aztime) {
            continue;
        }
        let sv = orbit.interpolate(aztime);
        let dr = target_xyz - sv.position;

        // The sign of (dr x v) . p separates the two look sides
        if k == 0 && (side == LookSide::Right) != (dr.cross(&sv.velocity).dot(&sv.position) > 0.0) {
            return Err(GeoError::LookSideMismatch { requested: side });
        }

        let slant_range = dr.norm();
        if let Some((range_min, range_max)) = range_bounds {
            if slant_range < range_min || slant_range > range_max {
                continue;
            }
        }

        if closest.map_or(true, |(r, _)| slant_range < r) {
            closest = Some((slant_range, aztime));
        }
    }

    Ok(closest.map_or(orbit.mid_time(), |(_, t)| t))
}

/// Map a ground point to radar coordinates.
///
/// When `aztime_guess` is absent or outside the orbit span, the azimuth
/// time is bootstrapped by a coarse orbit search. `range_bounds` optionally
/// restricts the bootstrap to ranges visible in the image (pass the first
/// and last slant range of the swath); the Newton iteration itself is not
/// bounded by it.
///
/// A look-side mismatch between the requested side and the actual geometry
/// is a hard error. Ordinary non-convergence is not: the result then holds
/// the last iterate with `converged` false.
pub fn geo2rdr(
    llh: &GeodeticPoint,
    ellipsoid: &Ellipsoid,
    orbit: &Orbit,
    doppler: &dyn DopplerModel,
    wavelength: f64,
    side: LookSide,
    params: &Geo2RdrParams,
    aztime_guess: Option<f64>,
    range_bounds: Option<(f64, f64)>,
) -> GeoResult<Geo2RdrResult> {
    let target_xyz = ellipsoid.lon_lat_to_xyz(llh);

    let mut aztime = match aztime_guess {
        Some(t) if orbit.contains(t) => t,
        _ => update_aztime(orbit, &target_xyz, side, range_bounds)?,
    };

    let mut slant_range = 0.0;
    let mut slant_range_old = 0.0;
    for i in 0..params.max_iter {
        let sv = orbit.interpolate(aztime);
        let dr = target_xyz - sv.position;

        // Re-check the look side at the first Newton iterate
        if i == 0 && (side == LookSide::Right) != (dr.cross(&sv.velocity).dot(&sv.position) > 0.0) {
            return Err(GeoError::LookSideMismatch { requested: side });
        }

        slant_range = dr.norm();
        if (slant_range - slant_range_old).abs() < params.threshold {
            return Ok(Geo2RdrResult {
                azimuth_time: aztime,
                slant_range,
                converged: true,
            });
        }
        slant_range_old = slant_range;

        let aztime_diff = doppler_aztime_diff(
            &dr,
            &sv.velocity,
            doppler,
            wavelength,
            aztime,
            slant_range,
            params.delta_range,
        );
        aztime -= aztime_diff;
    }

    Ok(Geo2RdrResult {
        azimuth_time: aztime,
        slant_range,
        converged: false,
    })
}
