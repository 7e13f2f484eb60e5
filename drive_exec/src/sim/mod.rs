//! # Simulation backends
//!
//! Stand-ins for the drive base and an external locator, so that position
//! control can be run and tested without a robot. Both share an [`Odometry`]
//! which acts as the simulated ground truth.
//!
//! [`Odometry`]: crate::loc::Odometry

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod drivetrain;
mod locator;

pub use drivetrain::SimDrivetrain;
pub use locator::SimLocator;
