//! Wheel odometry locator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, PoisonError, RwLock};

use log::{trace, warn};

use super::{LocError, LocalizedMovement, Locator, LocatorKind};
use crate::movement::Movement;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Odometry is the drive base's own dead-reckoned pose.
///
/// Its frame is fixed at the pose the robot was last reset to, so it is always
/// an absolute locator. It is shared between whatever integrates wheel motion
/// into it (the drivetrain) and whatever reads it (the controller).
#[derive(Debug)]
pub struct Odometry {
    name: String,
    state: RwLock<OdometryState>,
}

#[derive(Debug, Clone, Copy)]
struct OdometryState {
    /// Pose of the odometry frame origin in the field frame
    origin: Movement,

    /// Current pose in the odometry frame
    pose: Movement,

    /// False once the pose can no longer be trusted, e.g. after an encoder
    /// fault.
    valid: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    /// Create odometry whose frame is placed at `origin` in the field.
    pub fn new(name: &str, origin: Movement) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(OdometryState {
                origin,
                pose: Movement::zero(),
                valid: true,
            }),
        }
    }

    /// Current pose in the odometry frame, whether or not it is valid.
    pub fn pose(&self) -> Movement {
        self.read().pose
    }

    /// Overwrite the current pose.
    pub fn set_pose(&self, pose: Movement) {
        self.write().pose = pose;
    }

    /// Move the frame to `origin` and zero the pose. Also clears any previous
    /// invalidation.
    pub fn reset(&self, origin: Movement) {
        let mut state = self.write();
        state.origin = origin;
        state.pose = Movement::zero();
        state.valid = true;
    }

    /// Add a change in pose, given along the odometry frame's axes.
    pub fn integrate(&self, delta: Movement) {
        let mut state = self.write();
        state.pose = state.pose + delta;
        trace!("{} pose {}", self.name, state.pose);
    }

    /// Mark the pose as untrustworthy. Readings fail until
    /// [`Odometry::reset`] is called.
    pub fn invalidate(&self) {
        warn!("{} invalidated", self.name);
        self.write().valid = false;
    }

    /// Tag a movement as being in this odometry's frame.
    pub fn localize(self: &Arc<Self>, movement: Movement) -> LocalizedMovement {
        LocalizedMovement::construct(movement, self.clone())
    }

    fn read(&self) -> OdometryState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, OdometryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Locator for Odometry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LocatorKind {
        LocatorKind::AbsolutePosition
    }

    fn is_active(&self) -> bool {
        self.read().valid
    }

    fn get_location(&self) -> Result<Movement, LocError> {
        let state = self.read();
        if state.valid {
            Ok(state.pose)
        } else {
            Err(LocError::NoReading(self.name.clone()))
        }
    }

    fn frame_origin(&self) -> Movement {
        self.read().origin
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
