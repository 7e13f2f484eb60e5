//! Position control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::{
    drivetrain::{DriveError, Drivetrain},
    loc::{rotate_rate, same_locator, LocError, LocalizedMovement, Locator, LocatorKind, Odometry},
    movement::Movement,
};
use util::{module::RunStateToken, params, time::ElapsedTimer};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position controller built on a drive base's odometry.
pub struct PidController<D> {
    config: PidConfig,

    /// The drive base's own locator
    odometry: Arc<Odometry>,

    /// The same odometry, as a locator, for frame conversion and identity
    /// checks
    odometry_locator: Arc<dyn Locator>,

    drivetrain: D,

    /// Run state of the module that owns this controller, if any
    run_state: Option<RunStateToken>,
}

/// Summary of a completed drive.
#[derive(Debug, Clone, Serialize)]
pub struct DriveReport {
    /// Locator the drive finished on
    pub locator: String,

    /// Number of velocity commands sent, including the final zero command
    pub iterations: usize,

    /// True if the requested locator dropped out and the drive was finished on
    /// odometry
    pub fell_back: bool,

    /// Last pose read, in the frame of `locator`
    pub final_pose: Movement,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during position control.
#[derive(Debug, thiserror::Error)]
pub enum PidCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Invalid controller configuration: {0}")]
    Config(#[from] PidConfigError),

    /// The target was given in a frame that can't be driven to.
    #[error("Cannot drive to a target from locator {0}, it has no absolute position")]
    NoAbsolutePosition(String),

    #[error("Could not get the current location: {0}")]
    Location(#[from] LocError),

    #[error("Could not command the drivetrain: {0}")]
    Drivetrain(#[from] DriveError),

    /// The owning module was terminated mid-drive.
    #[error("Drive abandoned, the module has been terminated")]
    Terminated,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<D: Drivetrain> PidController<D> {
    /// Create a new controller with the given tuning.
    pub fn new(config: PidConfig, odometry: Arc<Odometry>, drivetrain: D) -> Self {
        let odometry_locator: Arc<dyn Locator> = odometry.clone();

        Self {
            config,
            odometry,
            odometry_locator,
            drivetrain,
            run_state: None,
        }
    }

    /// Create a new controller, loading the tuning from the given parameter
    /// file.
    pub fn init(
        params_path: &str,
        odometry: Arc<Odometry>,
        drivetrain: D,
    ) -> Result<Self, PidCtrlError> {
        let params: Params = params::load(params_path).map_err(PidCtrlError::ParamLoadError)?;

        Ok(Self::new(PidConfig::from_params(&params)?, odometry, drivetrain))
    }

    /// Stop driving when the given run state is terminated.
    pub fn with_run_state(mut self, run_state: RunStateToken) -> Self {
        self.run_state = Some(run_state);
        self
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn drivetrain_mut(&mut self) -> &mut D {
        &mut self.drivetrain
    }

    /// Drive to the target, returning once the controller output is zero.
    ///
    /// The loop is closed on the target's own locator while it is active. If
    /// it drops out the rest of the drive is done on odometry, towards the
    /// target as converted to the odometry frame before the drive began.
    ///
    /// Giving no target does nothing and returns no report.
    pub fn drive_to(
        &mut self,
        target: Option<LocalizedMovement>,
    ) -> Result<Option<DriveReport>, PidCtrlError> {
        let target = match target {
            Some(t) => t,
            None => {
                debug!("No drive target given");
                return Ok(None);
            }
        };

        let locator = target.locator().clone();
        if locator.kind() == LocatorKind::NoAbsolutePosition {
            return Err(PidCtrlError::NoAbsolutePosition(locator.name().to_string()));
        }

        let odometry_target = target.convert_to_other_locator(&self.odometry_locator)?;

        info!("Driving to {} (odometry {})", target, odometry_target.movement());

        let fallback = if same_locator(&locator, &self.odometry_locator) {
            None
        } else {
            Some(odometry_target.movement())
        };

        self.run(&locator, target.movement(), fallback).map(Some)
    }

    /// Drive to a target given in the odometry frame.
    pub fn drive_to_odometry(&mut self, target: Movement) -> Result<DriveReport, PidCtrlError> {
        info!("Driving to {} on odometry", target);

        let locator = self.odometry_locator.clone();
        self.run(&locator, target, None)
    }

    /// The control loop.
    ///
    /// If `fallback` is given and the locator goes inactive the drive is
    /// handed over to odometry with `fallback` as the target.
    fn run(
        &mut self,
        locator: &Arc<dyn Locator>,
        target: Movement,
        fallback: Option<Movement>,
    ) -> Result<DriveReport, PidCtrlError> {
        let mut x_info = MovementInfo::default();
        let mut y_info = MovementInfo::default();
        let mut theta_info = MovementInfo::default();

        let odometry_origin = self.odometry.frame_origin();
        let odometry_unit = self.odometry.angle_unit();

        // No timer until the first command has been sent, so the first
        // iteration has zero dt
        let mut timer: Option<ElapsedTimer> = None;
        let mut iterations = 0;

        loop {
            self.check_run_state()?;

            if let Some(odometry_target) = fallback {
                if !locator.is_active() {
                    warn!(
                        "{} is no longer active, finishing drive on odometry",
                        locator.name()
                    );

                    let mut report = self.drive_to_odometry(odometry_target)?;
                    report.iterations += iterations;
                    report.fell_back = true;
                    return Ok(report);
                }
            }

            let current = locator.get_location()?;
            let dt = timer.as_ref().map_or(0.0, ElapsedTimer::seconds);

            let velocity = Movement::new(
                calc_velocity(&mut x_info, &self.config, current.x, target.x, dt),
                calc_velocity(&mut y_info, &self.config, current.y, target.y, dt),
                calc_velocity(&mut theta_info, &self.config, current.theta, target.theta, dt),
            );

            // The drivetrain works along the odometry axes
            let command = rotate_rate(
                &velocity,
                &locator.frame_origin(),
                locator.angle_unit(),
                &odometry_origin,
                odometry_unit,
            );

            trace!(
                "[{}] current {} error <{}, {}, {}> velocity {} dt {:.4}",
                locator.name(),
                current,
                x_info.error,
                y_info.error,
                theta_info.error,
                velocity,
                dt
            );

            self.drivetrain.set_velocity(command)?;
            iterations += 1;

            timer = Some(ElapsedTimer::new());

            if velocity.is_zero() {
                let report = DriveReport {
                    locator: locator.name().to_string(),
                    iterations,
                    fell_back: false,
                    final_pose: current,
                };

                info!(
                    "Drive complete on {} after {} iterations at {}",
                    report.locator, report.iterations, report.final_pose
                );

                return Ok(report);
            }
        }
    }

    /// Stop and bail out if the owning module has been terminated.
    fn check_run_state(&mut self) -> Result<(), PidCtrlError> {
        let terminated = self
            .run_state
            .as_ref()
            .map_or(false, RunStateToken::is_terminated);

        if terminated {
            warn!("Module terminated during drive, stopping");

            if let Err(e) = self.drivetrain.set_velocity(Movement::zero()) {
                warn!("Could not stop the drivetrain: {}", e);
            }

            return Err(PidCtrlError::Terminated);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
