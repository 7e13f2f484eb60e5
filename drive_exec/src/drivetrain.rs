//! # Drivetrain interface
//!
//! The controller only ever asks the drive base for a velocity. How that is
//! turned into wheel commands is up to the implementation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use util::module::{Hardware, ModuleError};

use crate::movement::Movement;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A mobile base which can be commanded with a velocity.
pub trait Drivetrain {
    /// Command a velocity along the axes of the drive base's odometry frame.
    ///
    /// The heading component is a turn rate in the odometry's angle unit.
    fn set_velocity(&mut self, velocity: Movement) -> Result<(), DriveError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Drivetrain fault: {0}")]
    Fault(String),

    #[error("Drivetrain hardware unavailable: {0}")]
    Hardware(#[from] ModuleError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

/// A drivetrain owned by a module can only be commanded while the module is
/// running.
impl<D: Drivetrain> Drivetrain for Arc<Hardware<D>> {
    fn set_velocity(&mut self, velocity: Movement) -> Result<(), DriveError> {
        self.with(|drivetrain| drivetrain.set_velocity(velocity))?
    }
}
