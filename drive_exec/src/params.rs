//! Drive executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::movement::{AngleUnit, Movement};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated drive executable.
#[derive(Deserialize, Debug, Clone)]
pub struct DriveExecParams {
    /// Time each simulated velocity command is held for
    pub sim_step_s: f64,

    /// Pose of the odometry frame in the field
    pub odometry_origin: Movement,

    /// Pose of the fiducial camera's frame in the field, with the heading in
    /// `fiducial_angle_unit`
    pub fiducial_origin: Movement,

    /// Angle unit the fiducial camera reports headings in, degrees if not set.
    pub fiducial_angle_unit: Option<AngleUnit>,

    /// Number of readings after which the fiducial camera drops out, never if
    /// not set.
    pub fiducial_drop_out_after: Option<usize>,

    /// Period at which the pose monitor logs the pose
    pub pose_monitor_period_s: f64,

    /// Time given to worker threads to exit on shutdown
    pub worker_grace_period_s: f64,

    /// Targets to drive to, in order
    pub targets: Vec<TargetParams>,
}

/// A single drive target.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct TargetParams {
    pub frame: TargetFrame,
    pub pose: Movement,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The locator a target is given in.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetFrame {
    Odometry,
    Fiducial,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveExecParams {
    fn default() -> Self {
        Self {
            sim_step_s: 1.0,
            odometry_origin: Movement::zero(),
            fiducial_origin: Movement::new(6.0, -6.0, 90.0),
            fiducial_angle_unit: None,
            fiducial_drop_out_after: Some(10),
            pose_monitor_period_s: 0.5,
            worker_grace_period_s: 1.0,
            targets: vec![
                TargetParams {
                    frame: TargetFrame::Odometry,
                    pose: Movement::planar(12.0, 0.0),
                },
                TargetParams {
                    frame: TargetFrame::Fiducial,
                    pose: Movement::new(6.0, 6.0, -90.0),
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialise() {
        let params: DriveExecParams = util::params::from_str(
            r#"
            sim_step_s = 0.5
            odometry_origin = { x = 0.0, y = 0.0 }
            fiducial_origin = { x = 1.0, y = 2.0, theta = 1.5 }
            fiducial_angle_unit = "radians"
            pose_monitor_period_s = 0.1
            worker_grace_period_s = 2.0

            [[targets]]
            frame = "odometry"
            pose = { x = 12.0, y = 0.0 }

            [[targets]]
            frame = "fiducial"
            pose = { x = 3.0, y = -4.0, theta = 45.0 }
            "#,
        )
        .unwrap();

        assert_eq!(params.fiducial_drop_out_after, None);
        assert_eq!(params.fiducial_origin, Movement::new(1.0, 2.0, 1.5));
        assert_eq!(params.fiducial_angle_unit, Some(AngleUnit::Radians));
        assert_eq!(params.targets.len(), 2);
        assert_eq!(params.targets[0].frame, TargetFrame::Odometry);
        assert_eq!(params.targets[0].pose, Movement::planar(12.0, 0.0));
        assert_eq!(params.targets[1].frame, TargetFrame::Fiducial);
        assert_eq!(params.targets[1].pose, Movement::new(3.0, -4.0, 45.0));
    }
}
