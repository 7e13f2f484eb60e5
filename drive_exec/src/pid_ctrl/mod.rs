//! # PID position control module
//!
//! Position control drives the robot to a target pose. Each axis (x, y and
//! heading) has its own PID controller with an optional feed-forward term,
//! and the three outputs form the velocity commanded to the drivetrain.
//!
//! Targets may be given in the frame of any absolute [`Locator`]. While that
//! locator is active the controller closes the loop on its readings. If it
//! drops out the controller falls back to the drive base's own odometry,
//! using the target converted into the odometry frame before the drive
//! started.
//!
//! Control stops once all three axis outputs are within tolerance of zero,
//! which with no feed-forward happens once every axis error is inside the
//! deadband set by `minimum_abs_power`.
//!
//! [`Locator`]: crate::loc::Locator

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controllers::*;
pub use params::Params;
pub use state::*;
