//! In-memory planner for tests

use std::sync::{mpsc, Arc, Mutex};

use comms_if::eqpt::arm::{
    JointState, PlanTarget, PlanningGroup, Pose, Trajectory, TrajectoryPoint,
};

use super::{MotionPlanner, PlannerError};

/// A call made on the mock planner.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CartesianPath(Vec<Pose>),
    Plan(PlanningGroup, PlanTarget),
    Execute(PlanningGroup, Trajectory),
    Go(PlanningGroup, PlanTarget),
    NamedTargetValues(String),
}

/// Records every call and answers with canned trajectories.
pub struct MockPlanner {
    pub calls: Arc<Mutex<Vec<Call>>>,

    /// Returned by `plan_cartesian_path` and by `plan` for a pose target.
    pub approach: Trajectory,

    /// Returned by `plan` for a joint target.
    pub joint_motion: Trajectory,

    /// Value returned by `execute` and `go`.
    pub succeed: bool,

    /// Name of the call which should fail with a remote error.
    pub fail_on: Option<&'static str>,

    /// If set, the first `execute` sends on the first channel then waits on the second.
    pub block_execute: Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>,
}

impl MockPlanner {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            approach: trajectory(&[0.5, 1.0]),
            joint_motion: trajectory(&[1.0, 2.0]),
            succeed: true,
            fail_on: None,
            block_execute: None,
        }
    }

    fn record(&mut self, name: &'static str, call: Call) -> Result<(), PlannerError> {
        self.calls.lock().unwrap().push(call);

        match self.fail_on {
            Some(f) if f == name => Err(PlannerError::Remote(format!("{} failed", name))),
            _ => Ok(()),
        }
    }
}

/// A two joint trajectory with unit velocities reaching each of `times`.
pub fn trajectory(times: &[f64]) -> Trajectory {
    Trajectory {
        joint_names: vec!["j1".into(), "j2".into()],
        points: times
            .iter()
            .enumerate()
            .map(|(i, t)| TrajectoryPoint {
                positions: vec![i as f64 * 0.1, i as f64 * -0.1],
                velocities: vec![1.0, 1.0],
                accelerations: vec![0.5, 0.5],
                time_from_start_s: *t,
            })
            .collect(),
    }
}

impl MotionPlanner for MockPlanner {
    fn plan_cartesian_path(
        &mut self,
        _group: PlanningGroup,
        waypoints: &[Pose],
        _eef_step_m: f64,
        _jump_threshold: f64,
    ) -> Result<Trajectory, PlannerError> {
        self.record("plan_cartesian_path", Call::CartesianPath(waypoints.to_vec()))?;
        Ok(self.approach.clone())
    }

    fn plan(
        &mut self,
        group: PlanningGroup,
        target: &PlanTarget,
    ) -> Result<Trajectory, PlannerError> {
        self.record("plan", Call::Plan(group, target.clone()))?;

        match target {
            PlanTarget::Pose(_) => Ok(self.approach.clone()),
            PlanTarget::Joints(_) => Ok(self.joint_motion.clone()),
        }
    }

    fn execute(
        &mut self,
        group: PlanningGroup,
        trajectory: &Trajectory,
    ) -> Result<bool, PlannerError> {
        if let Some((entered, release)) = self.block_execute.take() {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }

        self.record("execute", Call::Execute(group, trajectory.clone()))?;
        Ok(self.succeed)
    }

    fn go(&mut self, group: PlanningGroup, target: &PlanTarget) -> Result<bool, PlannerError> {
        self.record("go", Call::Go(group, target.clone()))?;
        Ok(self.succeed)
    }

    fn named_target_values(
        &mut self,
        _group: PlanningGroup,
        name: &str,
    ) -> Result<JointState, PlannerError> {
        self.record("named_target_values", Call::NamedTargetValues(name.into()))?;

        let mut joints = JointState::new();
        let value = if name.contains("closed") { 0.0 } else { 0.04 };
        joints.insert("finger_left".into(), value);
        joints.insert("finger_right".into(), value);

        Ok(joints)
    }
}
