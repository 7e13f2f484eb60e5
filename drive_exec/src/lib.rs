//! # Drive library.
//!
//! This library allows other crates in the workspace, and the benches, to
//! access items defined inside the drive crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Drivetrain interface - the velocity command seam to the drive base
pub mod drivetrain;

/// Localisation module - where the robot is, according to each of its locators
pub mod loc;

/// Movement - the pose/velocity value type used throughout
pub mod movement;

/// Executable parameters
pub mod params;

/// Position control module - drives the robot to a target pose
pub mod pid_ctrl;

/// Simulated drivetrain and locator
pub mod sim;
