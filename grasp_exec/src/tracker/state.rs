//! Implementations for the Tracker state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{ObserveOutcome, Params, SharedTrackerState, TargetObservation, TrackerError};
use crate::{
    guard::lock_or_recover,
    localiser::{BrightSpotLocaliser, Localiser},
};
use comms_if::eqpt::cam::SensorFrame;
use util::{archive::Archiver, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracker module state
#[derive(Default)]
pub struct Tracker {
    pub(crate) params: Params,

    localiser: Option<Box<dyn Localiser + Send>>,

    state: SharedTrackerState,

    /// Number of frames dropped since the last processed one.
    frame_count: usize,

    archiver: Archiver,
}

/// Status report for Tracker processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// The frame was dropped by the frame skip counter.
    pub frame_skipped: bool,

    /// The frame could not be decoded.
    pub decode_failed: bool,

    /// What the tracker state did with the observation, if one was made.
    pub outcome: Option<ObserveOutcome>,
}

/// Flat archive record of one processed frame.
#[derive(Serialize)]
struct ArchiveRecord {
    time_s: f64,
    u_px: f64,
    v_px: f64,
    x_m: f64,
    y_m: f64,
    z_m: f64,
    vx_m_s: f64,
    vy_m_s: f64,
    vz_m_s: f64,
    outcome: Option<ObserveOutcome>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for Tracker {
    type InitData = &'static str;
    type InitError = TrackerError;

    type InputData = SensorFrame;
    type OutputData = Option<TargetObservation>;
    type StatusReport = StatusReport;
    type ProcError = TrackerError;

    /// Initialise the Tracker module.
    ///
    /// Expected init data is the path to the parameter file. If no localiser has been set a
    /// bright spot localiser using the threshold from the parameters is created.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(TrackerError::ParamLoadError)?;
        self.params.validate().map_err(TrackerError::InvalidParams)?;

        if self.localiser.is_none() {
            self.localiser = Some(Box::new(BrightSpotLocaliser {
                threshold: self.params.localiser_threshold,
            }));
        }

        self.archiver =
            Archiver::from_path(session, "tracker.csv").map_err(TrackerError::ArchiveError)?;

        self.frame_count = 0;

        Ok(())
    }

    /// Process one camera frame.
    ///
    /// Frames dropped by the skip counter or which fail to decode are not errors, they are
    /// reported in the status report and produce no output.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        if !self.admit_frame() {
            trace!("Frame from {} skipped", input_data.timestamp);
            report.frame_skipped = true;
            return Ok((None, report));
        }

        let image = match input_data.to_sensor_image() {
            Ok(i) => i,
            Err(e) => {
                warn!("Could not decode camera frame: {}", e);
                report.decode_failed = true;
                return Ok((None, report));
            }
        };

        let pixel = match self.localiser {
            Some(ref mut l) => l.localise(&image.image),
            None => return Err(TrackerError::NoLocaliser),
        };

        let position = self.params.estimator.estimate(pixel);
        let obs = TargetObservation::new(image.timestamp, position);

        let (outcome, velocity) = {
            let mut state = lock_or_recover(&self.state, "tracker state");
            let outcome = state.observe(obs);
            (outcome, state.velocity())
        };
        report.outcome = Some(outcome);

        match outcome {
            ObserveOutcome::NonFinite => trace!("No target in frame"),
            ObserveOutcome::Stale => debug!("Dropped out of order frame from {}", obs.timestamp),
            ObserveOutcome::Updated => debug!(
                "Target at ({:.3}, {:.3}, {:.3}) m, velocity ({:.3}, {:.3}, {:.3}) m/s",
                position.x,
                position.y,
                position.z,
                velocity.x,
                velocity.y,
                velocity.z
            ),
            _ => trace!(
                "Target at ({:.3}, {:.3}, {:.3}) m",
                position.x,
                position.y,
                position.z
            ),
        }

        if self.archiver.is_active() {
            let record = ArchiveRecord {
                time_s: util::session::try_get_elapsed_seconds().unwrap_or(std::f64::NAN),
                u_px: pixel[0],
                v_px: pixel[1],
                x_m: position.x,
                y_m: position.y,
                z_m: position.z,
                vx_m_s: velocity.x,
                vy_m_s: velocity.y,
                vz_m_s: velocity.z,
                outcome: Some(outcome),
            };
            if let Err(e) = self.archiver.serialise(&record) {
                warn!("Could not archive tracker data: {}", e);
            }
        }

        match outcome {
            ObserveOutcome::NonFinite | ObserveOutcome::Stale => Ok((None, report)),
            _ => Ok((Some(obs), report)),
        }
    }
}

impl Tracker {
    /// Create a tracker outside of a session, with the given parameters and localiser.
    #[cfg(test)]
    pub(crate) fn with_params(
        params: Params,
        localiser: Box<dyn Localiser + Send>,
    ) -> Result<Self, TrackerError> {
        params.validate().map_err(TrackerError::InvalidParams)?;

        Ok(Self {
            params,
            localiser: Some(localiser),
            ..Default::default()
        })
    }

    /// Handle to the observation and velocity state, for the grasp controller.
    pub fn shared_state(&self) -> SharedTrackerState {
        self.state.clone()
    }

    /// Count a new frame, returning true if it should be processed.
    ///
    /// Every `frame_skip`th frame is admitted, starting with the `frame_skip`th frame after
    /// initialisation.
    pub(crate) fn admit_frame(&mut self) -> bool {
        self.frame_count += 1;

        if self.frame_count < self.params.frame_skip {
            false
        } else {
            self.frame_count = 0;
            true
        }
    }

    /// Snapshot of the current tracker state.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> super::TrackerState {
        lock_or_recover(&self.state, "tracker state").clone()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::estimator::EstimatorParams;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use comms_if::eqpt::cam::{ImageFormat, SensorImage};
    use image::{DynamicImage, GrayImage, Luma};
    use nalgebra::Vector3;

    fn frame(timestamp: DateTime<Utc>, spot: Option<(u32, u32)>) -> SensorFrame {
        let mut img = GrayImage::new(16, 16);
        if let Some((u, v)) = spot {
            img.put_pixel(u, v, Luma([255]));
        }

        SensorImage {
            timestamp,
            image: DynamicImage::ImageLuma8(img),
        }
        .to_sensor_frame(ImageFormat::Png)
        .unwrap()
    }

    fn params(frame_skip: usize) -> Params {
        Params {
            frame_skip,
            localiser_threshold: 128,
            estimator: EstimatorParams {
                origin_x_m: 2.0,
                origin_y_m: 1.0,
                pixels_per_m: 10.0,
                target_z_m: 0.5,
            },
        }
    }

    fn tracker(frame_skip: usize) -> Tracker {
        Tracker::with_params(
            params(frame_skip),
            Box::new(BrightSpotLocaliser { threshold: 128 }),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_frame_skip_rejected() {
        let r = Tracker::with_params(
            params(0),
            Box::new(BrightSpotLocaliser { threshold: 128 }),
        );
        assert!(matches!(r, Err(TrackerError::InvalidParams(_))));
    }

    #[test]
    fn test_every_nth_frame_admitted() {
        let mut tracker = tracker(6);

        let admitted: Vec<usize> = (1..=18).filter(|_| tracker.admit_frame()).collect();

        assert_eq!(admitted, vec![6, 12, 18]);
    }

    #[test]
    fn test_frame_skip_of_one_admits_all() {
        let mut tracker = tracker(1);

        assert!((0..5).all(|_| tracker.admit_frame()));
    }

    #[test]
    fn test_proc_estimates_and_tracks() {
        let mut tracker = tracker(1);
        let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();

        let (out, report) = tracker.proc(&frame(t0, Some((10, 5)))).unwrap();
        assert_eq!(report.outcome, Some(ObserveOutcome::First));
        let obs = out.unwrap();
        assert!((obs.position.x - 1.0).abs() < 1e-9);
        assert!((obs.position.y - 0.5).abs() < 1e-9);
        assert!((obs.position.z - 0.5).abs() < 1e-9);
        assert_eq!(obs.timestamp, t0);

        // One pixel right over half a second is -0.1 m in X, so -0.2 m/s
        let (_, report) = tracker
            .proc(&frame(t0 + Duration::milliseconds(500), Some((11, 5))))
            .unwrap();
        assert_eq!(report.outcome, Some(ObserveOutcome::Updated));

        let v = tracker.snapshot().velocity();
        assert!((v.x + 0.2).abs() < 1e-9);
        assert!(v.y.abs() < 1e-9);
        assert!(v.z.abs() < 1e-9);
    }

    #[test]
    fn test_proc_empty_frame_leaves_state() {
        let mut tracker = tracker(1);
        let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();

        tracker.proc(&frame(t0, Some((10, 5)))).unwrap();
        let (out, report) = tracker
            .proc(&frame(t0 + Duration::seconds(1), None))
            .unwrap();

        assert!(out.is_none());
        assert_eq!(report.outcome, Some(ObserveOutcome::NonFinite));
        assert_eq!(tracker.snapshot().observation().unwrap().timestamp, t0);
    }

    #[test]
    fn test_proc_skipped_frames_not_decoded() {
        let mut tracker = tracker(3);
        let bad = SensorFrame {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            format: ImageFormat::Png,
            b64_data: String::from("not base64!"),
        };

        for _ in 0..2 {
            let (out, report) = tracker.proc(&bad).unwrap();
            assert!(out.is_none());
            assert!(report.frame_skipped);
            assert!(!report.decode_failed);
        }

        let (out, report) = tracker.proc(&bad).unwrap();
        assert!(out.is_none());
        assert!(!report.frame_skipped);
        assert!(report.decode_failed);
    }

    #[test]
    fn test_shared_state_is_the_tracker_state() {
        let tracker = tracker(6);
        let shared = tracker.shared_state();
        let t0 = Utc.timestamp_opt(1_600_000_000, 0).unwrap();

        {
            let mut state = shared.lock().unwrap();
            state.observe(TargetObservation::new(t0, Vector3::new(1.0, 0.5, 0.964)));
            state.observe(TargetObservation::new(
                t0 + Duration::milliseconds(500),
                Vector3::new(1.1, 0.45, 0.964),
            ));
        }

        let v = tracker.snapshot().velocity();
        assert!((v.x - 0.2).abs() < 1e-9);
        assert!((v.y + 0.1).abs() < 1e-9);
    }
}
