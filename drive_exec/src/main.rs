//! # Drive Executable
//!
//! Runs position control against the simulated drive base.
//!
//! # Architecture
//!
//! The executable owns a single concurrent module, `drive`, which holds:
//!
//!     - The drivetrain, as hardware gated on the module's run state
//!     - A pose monitor worker, logging the odometry pose while running
//!
//! Once the module is running the executable drives to each of the targets
//! listed in `drive_exec.toml`, then terminates the module and saves the drive
//! reports into the session directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;
use std::time::Duration;
use color_eyre::{Result, eyre::WrapErr};
use log::{error, info, warn};

// Internal
use drive_lib::{
    drivetrain::Drivetrain,
    loc::{LocalizedMovement, Locator, Odometry},
    params::{DriveExecParams, TargetFrame, TargetParams},
    pid_ctrl::{self, DriveReport, PidController},
    sim::{SimDrivetrain, SimLocator},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::ConcurrentModule,
    session::Session,
};

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams = util::params::load_or_default("drive_exec.toml")
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOCALISATION ----

    let odometry = Arc::new(Odometry::new("odometry", exec_params.odometry_origin));

    let mut fiducial = SimLocator::new(
        "fiducial",
        exec_params.fiducial_origin,
        odometry.clone()
    );
    if let Some(unit) = exec_params.fiducial_angle_unit {
        fiducial = fiducial.with_angle_unit(unit);
    }
    if let Some(num_reads) = exec_params.fiducial_drop_out_after {
        fiducial = fiducial.with_drop_out_after(num_reads);
    }
    let fiducial: Arc<dyn Locator> = Arc::new(fiducial);

    // ---- MODULE CONSTRUCTION ----

    let mut module = ConcurrentModule::new(
        "drive",
        Duration::from_secs_f64(exec_params.worker_grace_period_s)
    );

    let drivetrain = module.hardware(
        "drivetrain",
        SimDrivetrain::new(odometry.clone(), exec_params.sim_step_s)
    );

    let monitor_odometry = odometry.clone();
    let monitor_period = Duration::from_secs_f64(exec_params.pose_monitor_period_s);
    module.register_worker("pose_monitor", move |ctx| {
        if !ctx.wait_for_start() {
            return Ok(());
        }

        loop {
            info!("[{}] odometry pose {}", ctx.name(), monitor_odometry.pose());

            if !ctx.sleep(monitor_period) {
                break;
            }
        }

        Ok(())
    }).wrap_err("Failed to register the pose monitor")?;

    module.init().wrap_err("Failed to initialise the drive module")?;

    // Zero the drive base while nothing can command it
    let origin = exec_params.odometry_origin;
    drivetrain.initialise(|d| d.odometry().reset(origin))
        .wrap_err("Failed to initialise the drivetrain")?;

    let mut controller = PidController::init("pid_ctrl.toml", odometry.clone(), drivetrain.clone())
        .wrap_err("Failed to initialise position control")?
        .with_run_state(module.token());

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    module.start_threads().wrap_err("Failed to start the drive module")?;

    let drive_result = drive_all(
        &mut controller,
        &exec_params.targets,
        &odometry,
        &fiducial
    );

    // ---- SHUTDOWN ----

    // Leave the drivetrain stopped
    if let Err(e) = controller.drivetrain_mut().set_velocity(Default::default()) {
        warn!("Could not stop the drivetrain: {}", e);
    }

    let cleanup_report = module.cleanup();
    if !cleanup_report.is_clean() {
        warn!("Drive module did not shut down cleanly: {:?}", cleanup_report);
    }

    session.save_json("cleanup_report.json", &cleanup_report)
        .wrap_err("Failed to save the cleanup report")?;

    let reports = drive_result.wrap_err("Drive failed")?;

    session.save_json("drive_reports.json", &reports)
        .wrap_err("Failed to save the drive reports")?;

    info!("End of execution");

    Ok(())
}

/// Drive to each target in turn, stopping at the first failure.
fn drive_all<D: Drivetrain>(
    controller: &mut PidController<D>,
    targets: &[TargetParams],
    odometry: &Arc<Odometry>,
    fiducial: &Arc<dyn Locator>
) -> Result<Vec<DriveReport>, pid_ctrl::PidCtrlError> {
    let mut reports = Vec::with_capacity(targets.len());

    for (i, target) in targets.iter().enumerate() {
        let localized = match target.frame {
            TargetFrame::Odometry => odometry.localize(target.pose),
            TargetFrame::Fiducial => LocalizedMovement::construct(target.pose, fiducial.clone()),
        };

        info!("Target {}/{}: {}", i + 1, targets.len(), localized);

        match controller.drive_to(Some(localized)) {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => (),
            Err(e) => {
                error!("Drive to target {} failed: {}", i + 1, e);
                return Err(e);
            }
        }
    }

    Ok(reports)
}
