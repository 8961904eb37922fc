//! Implementations for the GraspCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::{sync::Mutex, thread, time::Duration};

// Internal
use super::{
    AbortReason, ApproachMode, CycleOutcome, CycleReport, GraspCtrlError, GraspPhase, GraspTargets,
    Params,
};
use crate::{
    duration::DurationConfig,
    guard::{lock_or_recover, ExecutionGuard},
    planner::MotionPlanner,
    predict,
    tracker::SharedTrackerState,
    traj,
};
use comms_if::{
    eqpt::arm::{JointState, PlanTarget, PlanningGroup, Pose, Trajectory},
    tc::{TriggerMsg, TriggerSource},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The arm, as owned by an execution session.
pub struct Actuator<P> {
    pub planner: P,
    pub phase: GraspPhase,
}

/// Grasp controller.
///
/// Shared between the trigger handlers, the watchdog and the duration server. Only the execution
/// guard serialises access to the planner, so a trigger arriving during a cycle is dropped rather
/// than queued.
pub struct GraspCtrl<P> {
    params: Params,

    targets: GraspTargets,

    /// Nominal grasp pose of the configured slot.
    down_pose: Pose,

    tracker_state: SharedTrackerState,

    duration: Mutex<DurationConfig>,

    actuator: ExecutionGuard<Actuator<P>>,

    gripper_closed: JointState,

    gripper_open: JointState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P: MotionPlanner> GraspCtrl<P> {
    /// Create a new controller.
    ///
    /// Validates the parameters against the targets and fetches the named gripper targets from
    /// the planner. The arm is not moved.
    pub fn new(
        params: Params,
        targets: GraspTargets,
        tracker_state: SharedTrackerState,
        mut planner: P,
    ) -> Result<Self, GraspCtrlError> {
        params.validate().map_err(GraspCtrlError::InvalidParams)?;
        targets
            .validate(params.trajectory_index)
            .map_err(GraspCtrlError::TargetsError)?;

        let down_pose = match targets.down_pose(params.trajectory_index) {
            Some(p) => *p,
            None => {
                return Err(GraspCtrlError::InvalidParams(format!(
                    "No down pose for trajectory index {}",
                    params.trajectory_index
                )))
            }
        };

        let gripper_closed = planner
            .named_target_values(PlanningGroup::Gripper, &params.gripper_closed_target)
            .map_err(GraspCtrlError::PlannerError)?;
        let gripper_open = planner
            .named_target_values(PlanningGroup::Gripper, &params.gripper_open_target)
            .map_err(GraspCtrlError::PlannerError)?;

        let duration = DurationConfig::new(
            params.initial_execution_time_s,
            targets.reference_duration_s(params.trajectory_index),
        );

        Ok(Self {
            params,
            targets,
            down_pose,
            tracker_state,
            duration: Mutex::new(duration),
            actuator: ExecutionGuard::new(Actuator {
                planner,
                phase: GraspPhase::Idle,
            }),
            gripper_closed,
            gripper_open,
        })
    }

    /// Handle a grasp trigger.
    ///
    /// A `false` trigger is ignored and a trigger arriving while the arm is busy is dropped.
    /// Otherwise a full cycle is run. The session is released before this returns whatever the
    /// result, planner errors are passed on after that.
    pub fn handle_trigger(
        &self,
        source: TriggerSource,
        msg: &TriggerMsg,
    ) -> Result<CycleOutcome, GraspCtrlError> {
        if !msg.data {
            debug!("Ignoring false {:?} trigger", source);
            return Ok(CycleOutcome::Ignored);
        }

        let mut session = match self.actuator.try_begin() {
            Some(s) => s,
            None => {
                debug!("Arm busy, dropping {:?} trigger", source);
                return Ok(CycleOutcome::Busy);
            }
        };

        info!("Grasp cycle started by {:?} trigger", source);

        let result = self.run_cycle(&mut *session, source);
        set_phase(&mut *session, GraspPhase::Idle);

        match result {
            Ok(CycleOutcome::Completed(report)) => {
                thread::sleep(Duration::from_secs_f64(self.params.settle_time_s));
                info!(
                    "Grasp cycle complete, target ({:.3}, {:.3}) m, speed factor {:.3}",
                    report.target_pose.position.x,
                    report.target_pose.position.y,
                    report.speed_factor
                );
                Ok(CycleOutcome::Completed(report))
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Grasp cycle failed: {}", e);
                Err(e)
            }
        }
    }

    /// Predict the grasp pose for a cycle starting at `now` with the current execution time.
    pub fn compute_target_pose(&self, now: &DateTime<Utc>) -> Pose {
        let execution_time_s = self.duration_config().execution_time_s;
        self.target_pose_at(now, execution_time_s)
    }

    /// Replace the execution time, returning false if it was rejected.
    pub fn set_execution_time(&self, execution_time_s: f64) -> bool {
        let reference = self
            .targets
            .reference_duration_s(self.params.trajectory_index);

        let accepted = lock_or_recover(&self.duration, "duration")
            .set_execution_time(execution_time_s, reference);

        if accepted {
            info!("Execution time set to {:.3} s", execution_time_s);
        } else {
            warn!("Rejected execution time of {} s", execution_time_s);
        }

        accepted
    }

    /// Snapshot of the duration configuration.
    pub fn duration_config(&self) -> DurationConfig {
        *lock_or_recover(&self.duration, "duration")
    }

    /// Move the arm home and open the gripper, unless a session is already active.
    ///
    /// Returns false if the arm was busy and nothing was done.
    pub fn make_safe(&self) -> Result<bool, GraspCtrlError> {
        let mut session = match self.actuator.try_begin() {
            Some(s) => s,
            None => return Ok(false),
        };

        let home = PlanTarget::Joints(self.targets.home_joint_state.clone());
        let open = PlanTarget::Joints(self.gripper_open.clone());

        let planner = &mut session.planner;
        if !planner
            .go(PlanningGroup::Arm, &home)
            .map_err(GraspCtrlError::PlannerError)?
        {
            warn!("Planner could not move the arm home");
        }
        if !planner
            .go(PlanningGroup::Gripper, &open)
            .map_err(GraspCtrlError::PlannerError)?
        {
            warn!("Planner could not open the gripper");
        }

        Ok(true)
    }

    /// Plan and execute a motion to the home joint state, unless a session is already active.
    ///
    /// Used at startup, before any trigger is accepted. Returns false if the arm was busy.
    pub fn move_home(&self) -> Result<bool, GraspCtrlError> {
        let mut session = match self.actuator.try_begin() {
            Some(s) => s,
            None => return Ok(false),
        };

        info!("Moving the arm to the home configuration");

        let home = PlanTarget::Joints(self.targets.home_joint_state.clone());
        let traj = session
            .planner
            .plan(PlanningGroup::Arm, &home)
            .map_err(GraspCtrlError::PlannerError)?;

        if !is_valid_plan(&traj, "home") {
            return Ok(true);
        }

        if !session
            .planner
            .execute(PlanningGroup::Arm, &traj)
            .map_err(GraspCtrlError::PlannerError)?
        {
            warn!("Planner could not move the arm home");
        }

        Ok(true)
    }

    fn target_pose_at(&self, now: &DateTime<Utc>, execution_time_s: f64) -> Pose {
        let state = lock_or_recover(&self.tracker_state, "tracker state");

        predict::predict_target_pose(
            &state,
            execution_time_s,
            now,
            &self.params.robot_origin,
            &self.down_pose,
        )
    }

    /// The grasp cycle, run inside a session.
    fn run_cycle(
        &self,
        actuator: &mut Actuator<P>,
        source: TriggerSource,
    ) -> Result<CycleOutcome, GraspCtrlError> {
        let duration = self.duration_config();

        // Snapshot the target pose
        let mut target_pose = self.target_pose_at(&Utc::now(), duration.execution_time_s);

        let x_clamped = predict::clamp_x(
            &mut target_pose,
            self.down_pose.position.x,
            self.params.x_tolerance_m,
        );
        if x_clamped {
            debug!(
                "Predicted grasp X outside tolerance, using nominal {:.3} m",
                self.down_pose.position.x
            );
        }

        // Plan the approach
        let approach = self.plan_approach(actuator, &target_pose)?;
        set_phase(actuator, GraspPhase::ApproachPlanned);

        if approach.is_empty() {
            info!("No approach path found, target unreachable this cycle");
            return Ok(CycleOutcome::Aborted(AbortReason::Unreachable));
        }

        if !is_valid_plan(&approach, "approach") {
            return Ok(CycleOutcome::Aborted(AbortReason::InvalidTrajectory(
                "approach",
            )));
        }

        let speed_factor = match traj::speed_factor(
            &approach,
            duration.execution_time_s - self.params.closing_allowance_s(),
        ) {
            Some(s) => s,
            None => {
                warn!(
                    "No valid speed factor for a {:?} s approach in {} s, aborting cycle",
                    approach.duration_s(),
                    duration.execution_time_s
                );
                return Ok(CycleOutcome::Aborted(AbortReason::InvalidSpeedFactor));
            }
        };

        let approach = traj::rescale(&approach, speed_factor);
        let mut failed_motions = 0;

        // Approach
        set_phase(actuator, GraspPhase::Approaching);
        failed_motions += self.execute(actuator, PlanningGroup::Arm, &approach, "approach")?;

        // Grasp
        set_phase(actuator, GraspPhase::Grasping);
        let close = actuator
            .planner
            .plan(
                PlanningGroup::Gripper,
                &PlanTarget::Joints(self.gripper_closed.clone()),
            )
            .map_err(GraspCtrlError::PlannerError)?;
        if !is_valid_plan(&close, "gripper close") {
            return Ok(CycleOutcome::Aborted(AbortReason::InvalidTrajectory(
                "gripper close",
            )));
        }
        let close = traj::rescale(&close, speed_factor);
        failed_motions += self.execute(actuator, PlanningGroup::Gripper, &close, "gripper close")?;

        // Return
        set_phase(actuator, GraspPhase::Returning);
        let ret = actuator
            .planner
            .plan(
                PlanningGroup::Arm,
                &PlanTarget::Joints(self.targets.home_joint_state.clone()),
            )
            .map_err(GraspCtrlError::PlannerError)?;
        if !is_valid_plan(&ret, "return") {
            return Ok(CycleOutcome::Aborted(AbortReason::InvalidTrajectory("return")));
        }
        let ret = traj::rescale(&ret, self.params.return_speed);
        failed_motions += self.execute(actuator, PlanningGroup::Arm, &ret, "return")?;

        // Release
        set_phase(actuator, GraspPhase::Released);
        if !actuator
            .planner
            .go(
                PlanningGroup::Gripper,
                &PlanTarget::Joints(self.gripper_open.clone()),
            )
            .map_err(GraspCtrlError::PlannerError)?
        {
            warn!("Planner reported the gripper release failed");
            failed_motions += 1;
        }

        Ok(CycleOutcome::Completed(CycleReport {
            source,
            target_pose,
            x_clamped,
            speed_factor,
            approach_duration_s: approach.duration_s().unwrap_or(0.0),
            failed_motions,
        }))
    }

    fn plan_approach(
        &self,
        actuator: &mut Actuator<P>,
        target_pose: &Pose,
    ) -> Result<Trajectory, GraspCtrlError> {
        let result = match self.params.approach_mode {
            ApproachMode::CartesianPath => {
                let mut pre_grasp = *target_pose;
                pre_grasp.position.z += self.params.approach_height_m;

                actuator.planner.plan_cartesian_path(
                    PlanningGroup::Arm,
                    &[pre_grasp, *target_pose],
                    self.params.cartesian_eef_step_m,
                    self.params.cartesian_jump_threshold,
                )
            }
            ApproachMode::Direct => actuator
                .planner
                .plan(PlanningGroup::Arm, &PlanTarget::Pose(*target_pose)),
        };

        result.map_err(GraspCtrlError::PlannerError)
    }

    /// Execute a trajectory, returning 1 if the planner reported failure and 0 otherwise.
    fn execute(
        &self,
        actuator: &mut Actuator<P>,
        group: PlanningGroup,
        trajectory: &Trajectory,
        what: &str,
    ) -> Result<usize, GraspCtrlError> {
        if trajectory.is_empty() {
            warn!("Empty {} trajectory, skipping", what);
            return Ok(1);
        }

        let ok = actuator
            .planner
            .execute(group, trajectory)
            .map_err(GraspCtrlError::PlannerError)?;

        if ok {
            Ok(0)
        } else {
            warn!("Planner reported the {} failed, continuing", what);
            Ok(1)
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn set_phase<P>(actuator: &mut Actuator<P>, phase: GraspPhase) {
    if actuator.phase != phase {
        debug!("Grasp phase {:?} -> {:?}", actuator.phase, phase);
        actuator.phase = phase;
    }
}

/// Check the structure of a trajectory from the planner before it is rescaled or executed.
fn is_valid_plan(trajectory: &Trajectory, what: &str) -> bool {
    match traj::validate(trajectory) {
        Ok(()) => true,
        Err(e) => {
            warn!("Planner returned an invalid {} trajectory: {}", what, e);
            false
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        planner::mock::{self, Call, MockPlanner},
        tracker::{TargetObservation, TrackerState},
    };
    use chrono::TimeZone;
    use comms_if::eqpt::arm::{Point, Quaternion};
    use nalgebra::Vector3;
    use std::sync::{mpsc, Arc};

    const TRIGGER: TriggerMsg = TriggerMsg { data: true };

    fn down_pose() -> Pose {
        Pose {
            position: Point {
                x: 0.35,
                y: 1.1,
                z: 0.25,
            },
            orientation: Quaternion {
                x: 0.0,
                y: 1.0,
                z: 0.0,
                w: 0.0,
            },
        }
    }

    fn home() -> JointState {
        let mut j = JointState::new();
        j.insert("j1".into(), 0.0);
        j.insert("j2".into(), 0.5);
        j
    }

    fn targets() -> GraspTargets {
        GraspTargets {
            home_pose: Pose::default(),
            home_joint_state: home(),
            down_poses: vec![down_pose()],
            down_trajectories: vec![mock::trajectory(&[0.0, 1.2])],
            up_trajectories: vec![],
        }
    }

    fn params() -> Params {
        Params {
            trajectory_index: 0,
            settle_time_s: 0.0,
            ..Default::default()
        }
    }

    struct Fixture {
        ctrl: GraspCtrl<MockPlanner>,
        calls: Arc<Mutex<Vec<Call>>>,
        tracker: SharedTrackerState,
    }

    fn fixture_with(params: Params, planner: MockPlanner) -> Fixture {
        let calls = planner.calls.clone();
        let tracker = TrackerState::new_shared();
        let ctrl = GraspCtrl::new(params, targets(), tracker.clone(), planner).unwrap();

        Fixture {
            ctrl,
            calls,
            tracker,
        }
    }

    fn fixture(planner: MockPlanner) -> Fixture {
        fixture_with(params(), planner)
    }

    /// Calls made after the gripper targets were fetched in `new`.
    fn cycle_calls(calls: &Arc<Mutex<Vec<Call>>>) -> Vec<Call> {
        calls.lock().unwrap().iter().skip(2).cloned().collect()
    }

    fn is_execute(call: &Call) -> bool {
        matches!(call, Call::Execute(..))
    }

    #[test]
    fn test_new_fetches_gripper_targets() {
        let f = fixture(MockPlanner::new());

        assert_eq!(
            *f.calls.lock().unwrap(),
            vec![
                Call::NamedTargetValues("gripper_closed".into()),
                Call::NamedTargetValues("gripper_open".into()),
            ]
        );

        let cfg = f.ctrl.duration_config();
        assert_eq!(cfg.execution_time_s, 0.5);
        assert!((cfg.speed_factor.unwrap() - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_new_rejects_index_out_of_range() {
        let r = GraspCtrl::new(
            Params {
                trajectory_index: 5,
                ..params()
            },
            targets(),
            TrackerState::new_shared(),
            MockPlanner::new(),
        );

        assert!(matches!(r, Err(GraspCtrlError::TargetsError(_))));
    }

    #[test]
    fn test_false_trigger_ignored() {
        let f = fixture(MockPlanner::new());

        let outcome = f
            .ctrl
            .handle_trigger(TriggerSource::Reactive, &TriggerMsg { data: false })
            .unwrap();

        assert_eq!(outcome, CycleOutcome::Ignored);
        assert!(cycle_calls(&f.calls).is_empty());
    }

    #[test]
    fn test_full_cycle() {
        let f = fixture(MockPlanner::new());

        let report = match f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap() {
            CycleOutcome::Completed(r) => r,
            o => panic!("Unexpected outcome {:?}", o),
        };

        // No observation yet, so the nominal pose is the target
        assert_eq!(report.target_pose, down_pose());
        assert!(!report.x_clamped);
        assert_eq!(report.failed_motions, 0);
        assert_eq!(report.source, TriggerSource::Adaptive);

        // 1.0 s approach squeezed into 0.5 - 0.15 s
        assert!((report.speed_factor - 1.0 / 0.35).abs() < 1e-9);
        assert!((report.approach_duration_s - 0.35).abs() < 1e-9);

        let calls = cycle_calls(&f.calls);
        assert_eq!(calls.len(), 7);

        match &calls[0] {
            Call::CartesianPath(w) => {
                assert_eq!(w.len(), 2);
                assert!((w[0].position.z - 0.55).abs() < 1e-9);
                assert_eq!(w[1], down_pose());
                assert_eq!(w[0].position.x, w[1].position.x);
            }
            c => panic!("Unexpected call {:?}", c),
        }

        match &calls[1] {
            Call::Execute(PlanningGroup::Arm, t) => {
                assert!((t.duration_s().unwrap() - 0.35).abs() < 1e-9);
                assert!((t.points[0].velocities[0] - 1.0 / 0.35).abs() < 1e-9);
            }
            c => panic!("Unexpected call {:?}", c),
        }

        let closed = {
            let mut j = JointState::new();
            j.insert("finger_left".into(), 0.0);
            j.insert("finger_right".into(), 0.0);
            j
        };
        assert_eq!(
            calls[2],
            Call::Plan(PlanningGroup::Gripper, PlanTarget::Joints(closed))
        );

        match &calls[3] {
            Call::Execute(PlanningGroup::Gripper, t) => {
                // The gripper close uses the approach speed factor
                assert!((t.duration_s().unwrap() - 2.0 * 0.35).abs() < 1e-9);
            }
            c => panic!("Unexpected call {:?}", c),
        }

        assert_eq!(
            calls[4],
            Call::Plan(PlanningGroup::Arm, PlanTarget::Joints(home()))
        );

        // The return is executed on the arm at the return speed
        match &calls[5] {
            Call::Execute(PlanningGroup::Arm, t) => {
                assert_eq!(*t, mock::trajectory(&[1.0, 2.0]));
            }
            c => panic!("Unexpected call {:?}", c),
        }

        assert!(matches!(&calls[6], Call::Go(PlanningGroup::Gripper, _)));
    }

    #[test]
    fn test_empty_path_aborts_without_execution() {
        let mut planner = MockPlanner::new();
        planner.approach = Trajectory::default();
        let f = fixture(planner);

        let outcome = f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap();

        assert_eq!(outcome, CycleOutcome::Aborted(AbortReason::Unreachable));
        assert!(!cycle_calls(&f.calls).iter().any(is_execute));

        // The session was released
        assert!(f.ctrl.make_safe().unwrap());
    }

    #[test]
    fn test_short_execution_time_aborts() {
        let f = fixture(MockPlanner::new());

        // Valid execution time, but shorter than the closing allowance
        assert!(f.ctrl.set_execution_time(0.1));

        let outcome = f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Aborted(AbortReason::InvalidSpeedFactor)
        );
        assert!(!cycle_calls(&f.calls).iter().any(is_execute));
    }

    #[test]
    fn test_x_outside_tolerance_clamped() {
        let f = fixture(MockPlanner::new());

        // Stationary target predicted 0.2 m past the nominal X
        f.tracker.lock().unwrap().observe(TargetObservation::new(
            Utc::now(),
            Vector3::new(1.55, 0.3, 0.964),
        ));

        let report = match f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap() {
            CycleOutcome::Completed(r) => r,
            o => panic!("Unexpected outcome {:?}", o),
        };

        assert!(report.x_clamped);
        assert_eq!(report.target_pose.position.x, 0.35);
        assert!((report.target_pose.position.y - 1.05).abs() < 1e-9);

        match &cycle_calls(&f.calls)[0] {
            Call::CartesianPath(w) => {
                assert_eq!(w[0].position.x, 0.35);
                assert_eq!(w[1].position.x, 0.35);
                assert!((w[1].position.y - 1.05).abs() < 1e-9);
            }
            c => panic!("Unexpected call {:?}", c),
        }
    }

    #[test]
    fn test_compute_target_pose() {
        let f = fixture(MockPlanner::new());
        let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(1);

        {
            let mut state = f.tracker.lock().unwrap();
            state.observe(TargetObservation::new(t0, Vector3::new(1.0, 1.0, 0.9)));
            state.observe(TargetObservation::new(t1, Vector3::new(1.2, 0.9, 0.9)));
        }

        assert!(f.ctrl.set_execution_time(0.25));
        let pose = f
            .ctrl
            .compute_target_pose(&(t1 + chrono::Duration::milliseconds(250)));

        assert!((pose.position.x - 0.3).abs() < 1e-9);
        assert!((pose.position.y - 1.15).abs() < 1e-9);
        assert_eq!(pose.position.z, 0.25);
        assert_eq!(pose.orientation, down_pose().orientation);
    }

    #[test]
    fn test_direct_approach() {
        let f = fixture_with(
            Params {
                approach_mode: ApproachMode::Direct,
                ..params()
            },
            MockPlanner::new(),
        );

        let report = match f.ctrl.handle_trigger(TriggerSource::Reactive, &TRIGGER).unwrap() {
            CycleOutcome::Completed(r) => r,
            o => panic!("Unexpected outcome {:?}", o),
        };

        assert!((report.speed_factor - 2.5).abs() < 1e-9);
        assert_eq!(
            cycle_calls(&f.calls)[0],
            Call::Plan(PlanningGroup::Arm, PlanTarget::Pose(down_pose()))
        );
    }

    #[test]
    fn test_failed_motions_do_not_stop_cycle() {
        let mut planner = MockPlanner::new();
        planner.succeed = false;
        let f = fixture(planner);

        match f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap() {
            CycleOutcome::Completed(r) => assert_eq!(r.failed_motions, 4),
            o => panic!("Unexpected outcome {:?}", o),
        }
    }

    #[test]
    fn test_planner_error_releases_session() {
        let mut planner = MockPlanner::new();
        planner.fail_on = Some("execute");
        let f = fixture(planner);

        let r = f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER);
        assert!(matches!(r, Err(GraspCtrlError::PlannerError(_))));

        // Watchdog can take the arm straight away
        assert!(f.ctrl.make_safe().unwrap());
    }

    #[test]
    fn test_busy_trigger_dropped() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let mut planner = MockPlanner::new();
        planner.block_execute = Some((entered_tx, release_rx));
        let f = fixture(planner);
        let ctrl = Arc::new(f.ctrl);

        let cycle_ctrl = ctrl.clone();
        let jh = std::thread::spawn(move || {
            cycle_ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER)
        });

        // Wait for the cycle to be executing the approach
        entered_rx.recv().unwrap();

        assert_eq!(
            ctrl.handle_trigger(TriggerSource::Reactive, &TRIGGER).unwrap(),
            CycleOutcome::Busy
        );
        assert!(!ctrl.make_safe().unwrap());
        assert!(!ctrl.move_home().unwrap());

        release_tx.send(()).unwrap();
        let outcome = jh.join().unwrap().unwrap();
        assert!(matches!(outcome, CycleOutcome::Completed(_)));

        // Exactly one cycle ran
        let cartesian = f
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::CartesianPath(_)))
            .count();
        assert_eq!(cartesian, 1);
    }

    #[test]
    fn test_set_execution_time() {
        let f = fixture(MockPlanner::new());

        assert!(f.ctrl.set_execution_time(0.8));
        let cfg = f.ctrl.duration_config();
        assert_eq!(cfg.execution_time_s, 0.8);
        assert!((cfg.speed_factor.unwrap() - 1.5).abs() < 1e-9);

        assert!(!f.ctrl.set_execution_time(-1.0));
        assert!(!f.ctrl.set_execution_time(std::f64::NAN));
        assert_eq!(f.ctrl.duration_config(), cfg);
    }

    #[test]
    fn test_move_home_and_make_safe() {
        let f = fixture(MockPlanner::new());

        assert!(f.ctrl.move_home().unwrap());
        assert!(f.ctrl.make_safe().unwrap());

        let calls = cycle_calls(&f.calls);
        assert_eq!(
            calls[0],
            Call::Plan(PlanningGroup::Arm, PlanTarget::Joints(home()))
        );
        assert_eq!(
            calls[1],
            Call::Execute(PlanningGroup::Arm, mock::trajectory(&[1.0, 2.0]))
        );
        assert_eq!(
            calls[2],
            Call::Go(PlanningGroup::Arm, PlanTarget::Joints(home()))
        );
        assert!(matches!(&calls[3], Call::Go(PlanningGroup::Gripper, _)));
    }

    #[test]
    fn test_malformed_approach_aborts_without_execution() {
        let mut non_increasing = MockPlanner::new();
        non_increasing.approach = mock::trajectory(&[1.0, 0.5]);

        let mut missing_joint = MockPlanner::new();
        missing_joint.approach.points[1].velocities.pop();

        for planner in vec![non_increasing, missing_joint] {
            let f = fixture(planner);

            let outcome = f.ctrl.handle_trigger(TriggerSource::Adaptive, &TRIGGER).unwrap();

            assert_eq!(
                outcome,
                CycleOutcome::Aborted(AbortReason::InvalidTrajectory("approach"))
            );
            assert!(!cycle_calls(&f.calls).iter().any(is_execute));
            assert!(f.ctrl.make_safe().unwrap());
        }
    }

    #[test]
    fn test_malformed_gripper_plan_aborts_after_approach() {
        let mut planner = MockPlanner::new();
        planner.joint_motion = mock::trajectory(&[1.0, 1.0]);
        let f = fixture(planner);

        let outcome = f.ctrl.handle_trigger(TriggerSource::Reactive, &TRIGGER).unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Aborted(AbortReason::InvalidTrajectory("gripper close"))
        );

        // Only the approach was executed
        let calls = cycle_calls(&f.calls);
        assert_eq!(calls.iter().filter(|c| is_execute(c)).count(), 1);
        assert!(matches!(&calls[1], Call::Execute(PlanningGroup::Arm, _)));

        assert!(f.ctrl.make_safe().unwrap());
    }

    #[test]
    fn test_move_home_skips_malformed_plan() {
        let mut planner = MockPlanner::new();
        planner.joint_motion.points[0].positions.push(0.0);
        let f = fixture(planner);

        assert!(f.ctrl.move_home().unwrap());
        assert!(!cycle_calls(&f.calls).iter().any(is_execute));
    }
}
