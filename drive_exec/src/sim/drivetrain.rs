//! Simulated drivetrain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use log::trace;

use crate::drivetrain::{DriveError, Drivetrain};
use crate::loc::Odometry;
use crate::movement::Movement;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A drivetrain which moves perfectly.
///
/// Every commanded velocity is held for one fixed step, so the pose changes by
/// `velocity * step_s` per command regardless of how fast the controller runs.
#[derive(Debug)]
pub struct SimDrivetrain {
    odometry: Arc<Odometry>,
    step_s: f64,

    /// Every velocity commanded so far, oldest first
    commands: Vec<Movement>,

    /// Number of commands after which the drivetrain faults
    fault_after: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDrivetrain {
    pub fn new(odometry: Arc<Odometry>, step_s: f64) -> Self {
        Self {
            odometry,
            step_s,
            commands: Vec::new(),
            fault_after: None,
        }
    }

    /// Refuse all commands once `num_commands` have been accepted.
    pub fn with_fault_after(mut self, num_commands: usize) -> Self {
        self.fault_after = Some(num_commands);
        self
    }

    pub fn commands(&self) -> &[Movement] {
        &self.commands
    }

    pub fn odometry(&self) -> &Arc<Odometry> {
        &self.odometry
    }
}

impl Drivetrain for SimDrivetrain {
    fn set_velocity(&mut self, velocity: Movement) -> Result<(), DriveError> {
        if let Some(limit) = self.fault_after {
            if self.commands.len() >= limit {
                return Err(DriveError::Fault(format!(
                    "simulated fault after {} commands",
                    limit
                )));
            }
        }

        trace!("Sim drivetrain velocity {}", velocity);

        self.commands.push(velocity);
        self.odometry.integrate(velocity * self.step_s);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Locator;

    #[test]
    fn test_integrates_commands() {
        let odom = Arc::new(Odometry::new("odometry", Movement::zero()));
        let mut drivetrain = SimDrivetrain::new(odom.clone(), 0.5);

        drivetrain.set_velocity(Movement::new(2.0, -1.0, 10.0)).unwrap();
        drivetrain.set_velocity(Movement::new(2.0, 0.0, 0.0)).unwrap();

        assert_eq!(odom.get_location().unwrap(), Movement::new(2.0, -0.5, 5.0));
        assert_eq!(drivetrain.commands().len(), 2);
    }

    #[test]
    fn test_fault() {
        let odom = Arc::new(Odometry::new("odometry", Movement::zero()));
        let mut drivetrain = SimDrivetrain::new(odom.clone(), 1.0).with_fault_after(1);

        drivetrain.set_velocity(Movement::planar(1.0, 0.0)).unwrap();
        assert!(matches!(
            drivetrain.set_velocity(Movement::planar(1.0, 0.0)),
            Err(DriveError::Fault(_))
        ));

        // The refused command didn't move anything
        assert_eq!(odom.pose(), Movement::planar(1.0, 0.0));
        assert_eq!(drivetrain.commands().len(), 1);
    }
}
