//! Orbit state vectors and Lagrange interpolation

use crate::types::{GeoError, GeoResult, StateVector, Vec3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-ordered satellite ephemeris
///
/// State vector times are seconds relative to `reference_epoch`. Queries
/// inside the span are answered by Lagrange interpolation; queries outside
/// it return a NaN-filled state vector and log a warning, so downstream
/// geometry degrades to NaN instead of extrapolating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orbit {
    pub reference_epoch: DateTime<Utc>,
    state_vectors: Vec<StateVector>,
}

impl Orbit {
    /// Build an orbit from state vectors, sorting them by time.
    ///
    /// At least two state vectors with strictly increasing times are
    /// required for interpolation.
    pub fn new(
        reference_epoch: DateTime<Utc>,
        mut state_vectors: Vec<StateVector>,
    ) -> GeoResult<Self> {
        if state_vectors.len() < 2 {
            return Err(GeoError::Orbit(format!(
                "Need at least 2 state vectors for interpolation, got {}",
                state_vectors.len()
            )));
        }

        state_vectors.sort_by(|a, b| a.time.total_cmp(&b.time));
        if state_vectors.windows(2).any(|w| !(w[1].time > w[0].time)) {
            return Err(GeoError::Orbit(
                "State vector times must be strictly increasing".to_string(),
            ));
        }

        Self::validate_state_vectors(&state_vectors);
        Ok(Orbit {
            reference_epoch,
            state_vectors,
        })
    }

    /// Check for plausible LEO kinematics and warn on outliers
    fn validate_state_vectors(state_vectors: &[StateVector]) {
        for sv in state_vectors {
            let velocity_magnitude = sv.velocity.norm();
            if velocity_magnitude < 6000.0 || velocity_magnitude > 9000.0 {
                log::warn!(
                    "Unusual orbital velocity: {:.1} m/s at t={:.3} s",
                    velocity_magnitude,
                    sv.time
                );
            }

            let position_magnitude = sv.position.norm();
            if position_magnitude < 6_500_000.0 || position_magnitude > 7_500_000.0 {
                log::warn!(
                    "Unusual orbital radius: {:.1} km at t={:.3} s",
                    position_magnitude / 1000.0,
                    sv.time
                );
            }
        }
    }

    pub fn state_vectors(&self) -> &[StateVector] {
        &self.state_vectors
    }

    /// First state vector time, seconds since the reference epoch
    pub fn start_time(&self) -> f64 {
        self.state_vectors[0].time
    }

    /// Last state vector time, seconds since the reference epoch
    pub fn end_time(&self) -> f64 {
        self.state_vectors[self.state_vectors.len() - 1].time
    }

    /// Midpoint of the valid interval
    pub fn mid_time(&self) -> f64 {
        self.start_time() + 0.5 * (self.end_time() - self.start_time())
    }

    /// Whether a time lies within the closed valid interval
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time() && time <= self.end_time()
    }

    /// Interpolate platform position and velocity at `time` (seconds since
    /// the reference epoch).
    ///
    /// Outside the valid interval the returned state vector is NaN-filled;
    /// callers detect this through NaN propagation rather than an error.
    pub fn interpolate(&self, time: f64) -> StateVector {
        if !self.contains(time) {
            log::warn!(
                "Requested time {:.3} s is outside orbit span [{:.3}, {:.3}] s",
                time,
                self.start_time(),
                self.end_time()
            );
            return StateVector {
                time,
                position: Vec3::repeat(f64::NAN),
                velocity: Vec3::repeat(f64::NAN),
            };
        }

        let (position, velocity) = self.lagrange_interpolate(time);
        StateVector {
            time,
            position,
            velocity,
        }
    }

    /// Lagrange interpolation over a 4-point window centered on `time`
    fn lagrange_interpolate(&self, time: f64) -> (Vec3, Vec3) {
        let svs = &self.state_vectors;
        let num_points = std::cmp::min(4, svs.len());

        // Center the window on the closest state vector, clamped to the ends
        let closest_idx = Self::binary_search_closest_time(svs, time);
        let start_idx = if closest_idx >= num_points / 2 {
            std::cmp::min(closest_idx - num_points / 2, svs.len() - num_points)
        } else {
            0
        };
        let window = &svs[start_idx..start_idx + num_points];

        let mut position = Vec3::zeros();
        let mut velocity = Vec3::zeros();
        for (i, sv) in window.iter().enumerate() {
            // Lagrange basis polynomial for this node
            let mut li = 1.0;
            for (j, other) in window.iter().enumerate() {
                if i != j {
                    li *= (time - other.time) / (sv.time - other.time);
                }
            }
            position += li * sv.position;
            velocity += li * sv.velocity;
        }
        (position, velocity)
    }

    /// Binary search for the state vector closest in time to `time`
    fn binary_search_closest_time(svs: &[StateVector], time: f64) -> usize {
        let mut left = 0;
        let mut right = svs.len() - 1;
        while left < right {
            let mid = left + (right - left) / 2;
            if svs[mid].time < time {
                left = mid + 1;
            } else {
                right = mid;
            }
        }

        if left > 0 && (svs[left - 1].time - time).abs() < (svs[left].time - time).abs() {
            return left - 1;
        }
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Quadratic test trajectory; cubic Lagrange must reproduce it exactly
    fn create_test_orbit() -> Orbit {
        let epoch = "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let p0 = Vec3::new(7_000_000.0, 0.0, 0.0);
        let v0 = Vec3::new(0.0, 7500.0, 0.0);
        let acc = Vec3::new(-8.0, 0.0, 0.1);

        let state_vectors = (0..=10)
            .map(|k| {
                let t = 10.0 * k as f64;
                StateVector {
                    time: t,
                    position: p0 + v0 * t + acc * (0.5 * t * t),
                    velocity: v0 + acc * t,
                }
            })
            .collect();
        Orbit::new(epoch, state_vectors).unwrap()
    }

    #[test]
    fn test_span_accessors() {
        let orbit = create_test_orbit();
        assert_eq!(orbit.start_time(), 0.0);
        assert_eq!(orbit.end_time(), 100.0);
        assert_eq!(orbit.mid_time(), 50.0);
        assert!(orbit.contains(0.0));
        assert!(orbit.contains(100.0));
        assert!(!orbit.contains(100.001));
    }

    #[test]
    fn test_interpolation_reproduces_quadratic() {
        let orbit = create_test_orbit();
        let p0 = Vec3::new(7_000_000.0, 0.0, 0.0);
        let v0 = Vec3::new(0.0, 7500.0, 0.0);
        let acc = Vec3::new(-8.0, 0.0, 0.1);

        for &t in &[0.0, 25.3, 50.0, 77.7, 100.0] {
            let sv = orbit.interpolate(t);
            let expected_pos = p0 + v0 * t + acc * (0.5 * t * t);
            let expected_vel = v0 + acc * t;
            for k in 0..3 {
                assert_abs_diff_eq!(sv.position[k], expected_pos[k], epsilon = 1e-6);
                assert_abs_diff_eq!(sv.velocity[k], expected_vel[k], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_out_of_span_returns_nan() {
        let orbit = create_test_orbit();
        let sv = orbit.interpolate(101.0);
        assert!(sv.position[0].is_nan());
        assert!(sv.position[2].is_nan());
        assert!(sv.velocity[1].is_nan());

        let sv = orbit.interpolate(-0.5);
        assert!(sv.position[0].is_nan());
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let epoch = "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mk = |t: f64| StateVector {
            time: t,
            position: Vec3::new(7_000_000.0, 1000.0 * t, 0.0),
            velocity: Vec3::new(0.0, 7500.0, 0.0),
        };
        let orbit = Orbit::new(epoch, vec![mk(20.0), mk(0.0), mk(10.0)]).unwrap();
        assert_eq!(orbit.start_time(), 0.0);
        assert_eq!(orbit.end_time(), 20.0);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let epoch = "2020-01-03T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let mk = |t: f64| StateVector {
            time: t,
            position: Vec3::new(7_000_000.0, 0.0, 0.0),
            velocity: Vec3::new(0.0, 7500.0, 0.0),
        };
        assert!(Orbit::new(epoch, vec![mk(0.0)]).is_err());
        assert!(Orbit::new(epoch, vec![mk(0.0), mk(0.0)]).is_err());
    }
}
