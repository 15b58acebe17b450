//! Waypoint trajectory time parameterization.
//!
//! Each polyline segment gets a symmetric trapezoidal velocity profile
//! under the global velocity ceiling: long segments accelerate to the
//! ceiling, cruise and decelerate; segments shorter than `v²/a` never reach
//! it and degrade to a triangular profile peaking at `√(a·d)`. In both
//! cases the traversal time is `d / v_peak + v_peak / a`.

use crate::engine_error::EngineError;
use crate::kinematic_traits::MAX_WAYPOINTS;
use crate::utils::to_array;
use nalgebra::Vector3;
use serde::Serialize;

/// Velocity ceiling applied when the request leaves it unspecified (m/s).
pub const DEFAULT_MAX_VELOCITY: f64 = 1.0;

/// Acceleration used by the symmetric ramps when unspecified (m/s²).
pub const DEFAULT_MAX_ACCELERATION: f64 = 2.0;

/// Derived timing of a parameterized polyline.
pub struct TrajectoryProfile {
    pub segment_times: Vec<f64>,
    pub total_distance: f64,
    pub total_time: f64,
    pub max_velocity_reached: f64,
    /// Waypoints annotated with arrival time and outbound velocity.
    pub waypoints: Vec<TimedWaypoint>,
}

/// One waypoint with its cumulative arrival time and the velocity vector
/// leaving it (zero at the final waypoint).
#[derive(Serialize)]
pub struct TimedWaypoint {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub time: f64,
}

/// Convert wire-format waypoints, enforcing dimension, finiteness and the
/// decode-time size ceiling.
pub fn waypoints_from_wire(raw: &[Vec<f64>]) -> Result<Vec<Vector3<f64>>, EngineError> {
    if raw.len() < 2 {
        return Err(EngineError::Validation(
            "at least two waypoints are required".into(),
        ));
    }
    if raw.len() > MAX_WAYPOINTS {
        return Err(EngineError::ResourceLimit {
            what: "waypoints",
            limit: MAX_WAYPOINTS,
            found: raw.len(),
        });
    }
    raw.iter()
        .map(|w| {
            if w.len() != 3 {
                return Err(EngineError::InvalidLength {
                    expected: 3,
                    found: w.len(),
                });
            }
            if !w.iter().all(|c| c.is_finite()) {
                return Err(EngineError::NonFinite("waypoint"));
            }
            Ok(Vector3::new(w[0], w[1], w[2]))
        })
        .collect()
}

/// Parameterize `waypoints` under the given ceiling and ramp acceleration.
pub fn parameterize(
    waypoints: &[Vector3<f64>],
    max_velocity: f64,
    max_acceleration: f64,
) -> Result<TrajectoryProfile, EngineError> {
    if waypoints.len() < 2 {
        return Err(EngineError::Validation(
            "at least two waypoints are required".into(),
        ));
    }
    if !(max_velocity.is_finite() && max_velocity > 0.0) {
        return Err(EngineError::Validation(
            "max_velocity must be positive".into(),
        ));
    }
    if !(max_acceleration.is_finite() && max_acceleration > 0.0) {
        return Err(EngineError::Validation(
            "max_acceleration must be positive".into(),
        ));
    }

    // Distance below which the trapezoid degrades to a triangle
    let cruise_threshold = max_velocity * max_velocity / max_acceleration;

    let mut segment_times = Vec::with_capacity(waypoints.len() - 1);
    let mut timed = Vec::with_capacity(waypoints.len());
    let mut total_distance = 0.0;
    let mut total_time = 0.0;
    let mut max_velocity_reached = 0.0f64;

    for pair in waypoints.windows(2) {
        let delta = pair[1] - pair[0];
        let distance = delta.norm();

        let (peak, time) = if distance <= f64::EPSILON {
            (0.0, 0.0)
        } else if distance >= cruise_threshold {
            (max_velocity, distance / max_velocity + max_velocity / max_acceleration)
        } else {
            let peak = (max_acceleration * distance).sqrt();
            (peak, distance / peak + peak / max_acceleration)
        };

        let velocity = if distance <= f64::EPSILON {
            Vector3::zeros()
        } else {
            delta * (peak / distance)
        };
        timed.push(TimedWaypoint {
            position: to_array(&pair[0]),
            velocity: to_array(&velocity),
            time: total_time,
        });

        total_distance += distance;
        total_time += time;
        max_velocity_reached = max_velocity_reached.max(peak);
        segment_times.push(time);
    }

    let last = waypoints[waypoints.len() - 1];
    timed.push(TimedWaypoint {
        position: to_array(&last),
        velocity: [0.0, 0.0, 0.0],
        time: total_time,
    });

    Ok(TrajectoryProfile {
        segment_times,
        total_distance,
        total_time,
        max_velocity_reached,
        waypoints: timed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(points: &[[f64; 3]]) -> Vec<Vec<f64>> {
        points.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn test_short_segment_triangular_profile() {
        let waypoints = waypoints_from_wire(&wire(&[[0.0; 3], [0.1, 0.0, 0.0]])).unwrap();
        let profile = parameterize(&waypoints, 1.0, 2.0).unwrap();
        // d < v²/a = 0.5, so the peak is sqrt(a·d) = sqrt(0.2)
        let expected_peak = 0.2f64.sqrt();
        assert!((profile.max_velocity_reached - expected_peak).abs() < 1e-12);
        assert!((profile.total_time - 2.0 * expected_peak / 2.0).abs() < 1e-12);
        assert!((profile.total_distance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_long_segment_reaches_ceiling() {
        let waypoints = waypoints_from_wire(&wire(&[[0.0; 3], [2.0, 0.0, 0.0]])).unwrap();
        let profile = parameterize(&waypoints, 1.0, 2.0).unwrap();
        assert!((profile.max_velocity_reached - 1.0).abs() < 1e-12);
        // t = d/v + v/a = 2.0 + 0.5
        assert!((profile.total_time - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_totals_are_exact_sums() {
        let waypoints = waypoints_from_wire(&wire(&[
            [0.0, 0.0, 0.0],
            [0.3, 0.0, 0.0],
            [0.3, 0.4, 0.0],
            [0.3, 0.4, 1.2],
        ]))
        .unwrap();
        let profile = parameterize(&waypoints, 0.8, 2.0).unwrap();
        assert_eq!(profile.segment_times.len(), 3);

        let summed_time: f64 = profile.segment_times.iter().sum();
        assert!((profile.total_time - summed_time).abs() < 1e-9);
        assert!((profile.total_distance - (0.3 + 0.4 + 1.2)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_segment_costs_nothing() {
        let waypoints =
            waypoints_from_wire(&wire(&[[0.0; 3], [0.0; 3], [0.5, 0.0, 0.0]])).unwrap();
        let profile = parameterize(&waypoints, 1.0, 2.0).unwrap();
        assert_eq!(profile.segment_times[0], 0.0);
        assert!(profile.segment_times[1] > 0.0);
        assert!((profile.total_distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_timed_waypoints_cumulative_and_terminal_rest() {
        let waypoints = waypoints_from_wire(&wire(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
        ]))
        .unwrap();
        let profile = parameterize(&waypoints, 1.0, 2.0).unwrap();
        assert_eq!(profile.waypoints.len(), 3);
        assert_eq!(profile.waypoints[0].time, 0.0);
        assert!((profile.waypoints[1].time - profile.segment_times[0]).abs() < 1e-12);
        assert!((profile.waypoints[2].time - profile.total_time).abs() < 1e-12);
        // Outbound velocity points along the segment at its peak speed
        assert!((profile.waypoints[0].velocity[0] - 1.0).abs() < 1e-12);
        assert_eq!(profile.waypoints[2].velocity, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_wire_validation() {
        assert!(waypoints_from_wire(&wire(&[[0.0; 3]])).is_err());
        assert!(waypoints_from_wire(&[vec![0.0, 1.0], vec![0.0, 1.0, 2.0]]).is_err());
        assert!(waypoints_from_wire(&[vec![0.0, 1.0, f64::NAN], vec![0.0; 3]]).is_err());
    }

    #[test]
    fn test_parameterize_rejects_bad_limits() {
        let waypoints = waypoints_from_wire(&wire(&[[0.0; 3], [1.0, 0.0, 0.0]])).unwrap();
        assert!(parameterize(&waypoints, 0.0, 2.0).is_err());
        assert!(parameterize(&waypoints, 1.0, -1.0).is_err());
        assert!(parameterize(&waypoints, f64::NAN, 2.0).is_err());
    }
}
