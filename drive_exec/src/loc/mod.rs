//! # Localisation module
//!
//! A [`Locator`] is any source which can tell the robot where it is: wheel
//! odometry, a fiducial camera, a field beacon. Each locator reports poses in
//! its own coordinate frame, which is placed in the field frame by the
//! locator's [`Locator::frame_origin`].
//!
//! Poses tagged with the frame they were measured in are
//! [`LocalizedMovement`]s, and can be re-expressed in any other absolute
//! frame.
//!
//! ## Field frame
//!
//! Right handed, x forward along the field, y to the left, heading measured
//! counter-clockwise from +x. A locator frame with origin `(ox, oy, ot)` maps
//! a local pose `(x, y, t)` to the field pose
//! `(ox + x cos(ot) - y sin(ot), oy + x sin(ot) + y cos(ot), ot + t)`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod localized;
mod odometry;

pub use localized::{reframe, rotate_rate, LocalizedMovement};
pub use odometry::Odometry;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::movement::{AngleUnit, Movement, ANGLE_UNIT};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of the robot's position.
pub trait Locator: Send + Sync {
    /// Name of the source, used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the source can give an absolute fix.
    fn kind(&self) -> LocatorKind;

    /// Whether the source currently has a usable reading. Sources may come
    /// and go between calls, so this is evaluated every time.
    fn is_active(&self) -> bool;

    /// Get the current pose in this locator's own frame.
    ///
    /// Use [`LocalizedMovement::locate`] to get the reading tagged with its
    /// frame.
    fn get_location(&self) -> Result<Movement, LocError>;

    /// Unit used for headings reported by this locator.
    fn angle_unit(&self) -> AngleUnit {
        ANGLE_UNIT
    }

    /// Pose of this locator's frame origin in the field frame, with the
    /// heading in [`Locator::angle_unit`].
    ///
    /// Only meaningful for [`LocatorKind::AbsolutePosition`] locators.
    fn frame_origin(&self) -> Movement {
        Movement::zero()
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Capability of a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    /// The locator's frame is fixed in the field, so its readings can be
    /// converted to and from other absolute frames.
    AbsolutePosition,

    /// The locator only gives relative readings (e.g. distance to a game
    /// piece) which can't be placed in the field.
    NoAbsolutePosition,
}

#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("Locator {0} cannot provide an absolute position")]
    NoAbsolutePosition(String),

    #[error("Locator {0} has no reading available")]
    NoReading(String),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Locators are compared by identity, two locators are the same only if they
/// are the same object.
pub fn same_locator(a: &Arc<dyn Locator>, b: &Arc<dyn Locator>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
