//! Target observation and velocity state shared between the tracker and the grasp controller

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use util::time::seconds_between;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Velocity of the target in the world frame.
///
/// Units: meters/second
pub type TargetVelocity = Vector3<f64>;

/// Tracker state as shared with the grasp controller. Readers must take the lock once and read
/// both the observation and the velocity from the same guard.
pub type SharedTrackerState = Arc<Mutex<TrackerState>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A timestamped world frame position of the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetObservation {
    /// Time at which the frame containing the target was captured.
    pub timestamp: DateTime<Utc>,

    /// Position of the target in the world frame.
    ///
    /// Units: meters
    pub position: Vector3<f64>,
}

/// The latest accepted observation and the velocity estimated when it was accepted.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    observation: Option<TargetObservation>,
    velocity: TargetVelocity,
}

/// What `TrackerState::observe` did with an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObserveOutcome {
    /// A coordinate was NaN or infinite, nothing changed.
    NonFinite,

    /// This was the first observation. It was stored and the velocity left unchanged.
    First,

    /// The observation is older than the stored one and was dropped.
    Stale,

    /// The observation has the same timestamp as the stored one. It replaced the stored one but
    /// the velocity was left unchanged.
    ZeroElapsed,

    /// The observation was stored and the velocity updated.
    Updated,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TargetObservation {
    pub fn new(timestamp: DateTime<Utc>, position: Vector3<f64>) -> Self {
        Self {
            timestamp,
            position,
        }
    }

    /// True if every coordinate of the position is a finite number.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}

impl TrackerState {
    /// Create a new empty state behind a shared lock.
    #[cfg(test)]
    pub(crate) fn new_shared() -> SharedTrackerState {
        Arc::new(Mutex::new(Self::default()))
    }

    /// The latest accepted observation, if any.
    pub fn observation(&self) -> Option<&TargetObservation> {
        self.observation.as_ref()
    }

    /// The current velocity estimate, zero until two observations have been accepted.
    pub fn velocity(&self) -> TargetVelocity {
        self.velocity
    }

    /// Update the state with a new observation.
    ///
    /// Each axis of the velocity is the difference in position over the time between this
    /// observation and the previous one.
    pub fn observe(&mut self, obs: TargetObservation) -> ObserveOutcome {
        if !obs.is_finite() {
            return ObserveOutcome::NonFinite;
        }

        let prev = match self.observation {
            Some(p) => p,
            None => {
                self.observation = Some(obs);
                return ObserveOutcome::First;
            }
        };

        let dt = match seconds_between(&prev.timestamp, &obs.timestamp) {
            Some(dt) => dt,
            None => return ObserveOutcome::Stale,
        };

        if dt < 0.0 {
            return ObserveOutcome::Stale;
        }

        if dt == 0.0 {
            self.observation = Some(obs);
            return ObserveOutcome::ZeroElapsed;
        }

        self.velocity = (obs.position - prev.position) / dt;
        self.observation = Some(obs);

        ObserveOutcome::Updated
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(t0: &DateTime<Utc>, millis: i64, x: f64, y: f64, z: f64) -> TargetObservation {
        TargetObservation::new(*t0 + Duration::milliseconds(millis), Vector3::new(x, y, z))
    }

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000, 0).unwrap()
    }

    #[test]
    fn test_first_observation_keeps_zero_velocity() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        assert_eq!(state.observe(at(&t0, 0, 1.0, 0.5, 0.964)), ObserveOutcome::First);
        assert_eq!(state.velocity(), Vector3::zeros());
        assert_eq!(state.observation().unwrap().position.x, 1.0);
    }

    #[test]
    fn test_velocity_from_two_observations() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        state.observe(at(&t0, 0, 1.0, 0.5, 0.964));
        let outcome = state.observe(at(&t0, 500, 1.1, 0.45, 0.964));

        assert_eq!(outcome, ObserveOutcome::Updated);
        let v = state.velocity();
        assert!((v.x - 0.2).abs() < 1e-9);
        assert!((v.y + 0.1).abs() < 1e-9);
        assert!(v.z.abs() < 1e-9);
        assert_eq!(state.observation().unwrap().timestamp, t0 + Duration::milliseconds(500));
    }

    #[test]
    fn test_axes_are_independent() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        state.observe(at(&t0, 0, 0.0, 0.0, 0.0));
        state.observe(at(&t0, 1000, 0.0, 0.0, 0.3));

        let v = state.velocity();
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert!((v.z - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_observation_ignored() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        state.observe(at(&t0, 0, 1.0, 0.5, 0.964));
        state.observe(at(&t0, 500, 1.1, 0.45, 0.964));

        for obs in &[
            at(&t0, 1000, std::f64::NAN, 0.4, 0.964),
            at(&t0, 1000, 1.2, std::f64::INFINITY, 0.964),
            at(&t0, 1000, 1.2, 0.4, std::f64::NAN),
        ] {
            assert_eq!(state.observe(*obs), ObserveOutcome::NonFinite);
        }

        assert_eq!(state.observation().unwrap().position.x, 1.1);
        assert!((state.velocity().x - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_first_observation_ignored() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        assert_eq!(
            state.observe(at(&t0, 0, std::f64::NAN, std::f64::NAN, 0.964)),
            ObserveOutcome::NonFinite
        );
        assert!(state.observation().is_none());
    }

    #[test]
    fn test_zero_elapsed_replaces_without_velocity() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        state.observe(at(&t0, 0, 1.0, 0.5, 0.964));
        let outcome = state.observe(at(&t0, 0, 1.3, 0.5, 0.964));

        assert_eq!(outcome, ObserveOutcome::ZeroElapsed);
        assert_eq!(state.velocity(), Vector3::zeros());
        assert_eq!(state.observation().unwrap().position.x, 1.3);
    }

    #[test]
    fn test_stale_observation_dropped() {
        let t0 = epoch();
        let mut state = TrackerState::default();

        state.observe(at(&t0, 1000, 1.0, 0.5, 0.964));
        let outcome = state.observe(at(&t0, 500, 0.0, 0.0, 0.964));

        assert_eq!(outcome, ObserveOutcome::Stale);
        assert_eq!(state.observation().unwrap().position.x, 1.0);
        assert_eq!(state.velocity(), Vector3::zeros());
    }
}
