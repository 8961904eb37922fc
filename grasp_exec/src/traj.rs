//! # Trajectory utilities
//!
//! Time rescaling of planned joint trajectories and checks on their structure.
//!
//! Rescaling by a speed factor `k` keeps the path in joint space and changes how fast it is
//! followed: every time from start is divided by `k` while velocities and accelerations are
//! multiplied by `k`. Positions are a kinematic configuration and never change.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::arm::{Trajectory, TrajectoryPoint};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Ways in which a trajectory can be malformed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrajectoryError {
    #[error("Waypoint {index} has {found} {field} but the trajectory has {expected} joints")]
    LengthMismatch {
        index: usize,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Waypoint {0} has a non-finite time from start")]
    NonFiniteTime(usize),

    #[error("Waypoint {0} does not come strictly after the previous waypoint")]
    NonIncreasingTime(usize),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Rescale a trajectory by the given speed factor, returning a new trajectory.
///
/// The input is never modified. The caller must make sure `speed_factor` is finite and nonzero,
/// see [`speed_factor`].
pub fn rescale(traj: &Trajectory, speed_factor: f64) -> Trajectory {
    Trajectory {
        joint_names: traj.joint_names.clone(),
        points: traj
            .points
            .iter()
            .map(|p| TrajectoryPoint {
                positions: p.positions.clone(),
                velocities: p.velocities.iter().map(|v| v * speed_factor).collect(),
                accelerations: p.accelerations.iter().map(|a| a * speed_factor).collect(),
                time_from_start_s: p.time_from_start_s / speed_factor,
            })
            .collect(),
    }
}

/// Compute the speed factor which makes `planned` finish in `target_duration_s`.
///
/// Returns `None` when no usable factor exists: the trajectory is empty, the target duration is
/// not strictly positive, or the result is zero or not finite.
pub fn speed_factor(planned: &Trajectory, target_duration_s: f64) -> Option<f64> {
    let planned_duration_s = planned.duration_s()?;

    if !(target_duration_s > 0.0) || !target_duration_s.is_finite() {
        return None;
    }

    let factor = planned_duration_s / target_duration_s;

    if factor.is_finite() && factor > 0.0 {
        Some(factor)
    } else {
        None
    }
}

/// Check the structure of a trajectory.
///
/// Every waypoint must have one position, velocity and acceleration per joint and the times from
/// start must be finite and strictly increasing.
pub fn validate(traj: &Trajectory) -> Result<(), TrajectoryError> {
    let num_joints = traj.joint_names.len();
    let mut prev_time_s: Option<f64> = None;

    for (index, point) in traj.points.iter().enumerate() {
        for (field, len) in [
            ("positions", point.positions.len()),
            ("velocities", point.velocities.len()),
            ("accelerations", point.accelerations.len()),
        ]
        .iter()
        {
            if *len != num_joints {
                return Err(TrajectoryError::LengthMismatch {
                    index,
                    field: *field,
                    expected: num_joints,
                    found: *len,
                });
            }
        }

        if !point.time_from_start_s.is_finite() {
            return Err(TrajectoryError::NonFiniteTime(index));
        }

        if let Some(prev) = prev_time_s {
            if point.time_from_start_s <= prev {
                return Err(TrajectoryError::NonIncreasingTime(index));
            }
        }
        prev_time_s = Some(point.time_from_start_s);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_joint_traj(times: &[f64]) -> Trajectory {
        Trajectory {
            joint_names: vec!["a1".into(), "a2".into()],
            points: times
                .iter()
                .enumerate()
                .map(|(i, t)| TrajectoryPoint {
                    positions: vec![0.1 * i as f64, -0.2 * i as f64],
                    velocities: vec![1.0, 1.0],
                    accelerations: vec![0.5, -0.5],
                    time_from_start_s: *t,
                })
                .collect(),
        }
    }

    #[test]
    fn test_rescale_doubles_speed() {
        let traj = two_joint_traj(&[1.0, 2.0]);
        let fast = rescale(&traj, 2.0);

        assert_eq!(fast.joint_names, traj.joint_names);
        assert_eq!(fast.len(), 2);

        let times: Vec<f64> = fast.points.iter().map(|p| p.time_from_start_s).collect();
        assert_eq!(times, vec![0.5, 1.0]);

        for (new, old) in fast.points.iter().zip(traj.points.iter()) {
            assert_eq!(new.positions, old.positions);
            assert_eq!(new.velocities, vec![2.0, 2.0]);
            assert_eq!(new.accelerations, vec![1.0, -1.0]);
        }

        // Input untouched
        assert_eq!(traj.points[0].time_from_start_s, 1.0);
        assert_eq!(traj.points[0].velocities, vec![1.0, 1.0]);
    }

    #[test]
    fn test_rescale_slow_down_and_back() {
        let traj = two_joint_traj(&[0.2, 0.7, 1.3]);

        for k in [0.25, 0.5, 3.0, 10.0].iter() {
            let scaled = rescale(&traj, *k);

            for (new, old) in scaled.points.iter().zip(traj.points.iter()) {
                assert_eq!(new.positions, old.positions);
                assert!((new.time_from_start_s - old.time_from_start_s / k).abs() < 1e-12);
                for (nv, ov) in new.velocities.iter().zip(old.velocities.iter()) {
                    assert!((nv - ov * k).abs() < 1e-12);
                }
            }

            assert!(validate(&scaled).is_ok());
        }
    }

    #[test]
    fn test_rescale_empty() {
        let traj = Trajectory::default();
        assert!(rescale(&traj, 2.0).is_empty());
    }

    #[test]
    fn test_speed_factor() {
        let traj = two_joint_traj(&[0.5, 1.7]);

        let k = speed_factor(&traj, 0.35).unwrap();
        assert!((k - 1.7 / 0.35).abs() < 1e-12);

        // The rescaled trajectory then lasts exactly the target duration
        let scaled = rescale(&traj, k);
        assert!((scaled.duration_s().unwrap() - 0.35).abs() < 1e-12);

        assert_eq!(speed_factor(&Trajectory::default(), 0.35), None);
        assert_eq!(speed_factor(&traj, 0.0), None);
        assert_eq!(speed_factor(&traj, -0.1), None);
        assert_eq!(speed_factor(&traj, std::f64::NAN), None);
        assert_eq!(speed_factor(&two_joint_traj(&[0.0]), 0.5), None);
    }

    #[test]
    fn test_validate() {
        assert!(validate(&two_joint_traj(&[0.0, 0.1, 0.2])).is_ok());

        assert_eq!(
            validate(&two_joint_traj(&[0.0, 0.1, 0.1])),
            Err(TrajectoryError::NonIncreasingTime(2))
        );
        assert_eq!(
            validate(&two_joint_traj(&[0.0, std::f64::INFINITY])),
            Err(TrajectoryError::NonFiniteTime(1))
        );

        let mut traj = two_joint_traj(&[0.0, 0.1]);
        traj.points[1].accelerations.pop();
        assert_eq!(
            validate(&traj),
            Err(TrajectoryError::LengthMismatch {
                index: 1,
                field: "accelerations",
                expected: 2,
                found: 1
            })
        );
    }
}
