//! Movements tagged with the frame they were measured in

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;
use std::sync::Arc;

use nalgebra::{Isometry2, Point2, UnitComplex, Vector2};

use super::{same_locator, LocError, Locator, LocatorKind};
use crate::movement::{AngleUnit, Movement};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A movement in the frame of a particular locator.
#[derive(Clone)]
pub struct LocalizedMovement {
    movement: Movement,
    locator: Arc<dyn Locator>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalizedMovement {
    pub fn construct(movement: Movement, locator: Arc<dyn Locator>) -> Self {
        Self { movement, locator }
    }

    /// Read the current location from the locator, tagged with its frame.
    pub fn locate(locator: &Arc<dyn Locator>) -> Result<Self, LocError> {
        Ok(Self::construct(locator.get_location()?, locator.clone()))
    }

    pub fn movement(&self) -> Movement {
        self.movement
    }

    pub fn locator(&self) -> &Arc<dyn Locator> {
        &self.locator
    }

    /// Express the same physical pose in the frame of `target`.
    ///
    /// Both locators must be absolute, even when `target` is this movement's
    /// own locator. Converting to the own locator returns the movement
    /// unchanged. Headings are
    /// not wrapped, so a heading of 370 degrees stays 370 degrees plus the
    /// difference between the frames.
    pub fn convert_to_other_locator(
        &self,
        target: &Arc<dyn Locator>,
    ) -> Result<LocalizedMovement, LocError> {
        for locator in [&self.locator, target].iter() {
            if locator.kind() == LocatorKind::NoAbsolutePosition {
                return Err(LocError::NoAbsolutePosition(locator.name().to_string()));
            }
        }

        if same_locator(&self.locator, target) {
            return Ok(self.clone());
        }

        let movement = reframe(
            &self.movement,
            &self.locator.frame_origin(),
            self.locator.angle_unit(),
            &target.frame_origin(),
            target.angle_unit(),
        );

        Ok(Self::construct(movement, target.clone()))
    }
}

impl fmt::Debug for LocalizedMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizedMovement")
            .field("movement", &self.movement)
            .field("locator", &self.locator.name())
            .finish()
    }
}

impl fmt::Display for LocalizedMovement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.movement, self.locator.name())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the isometry taking points in a frame to the field frame.
fn field_isometry(origin: &Movement, unit: AngleUnit) -> Isometry2<f64> {
    Isometry2::new(
        Vector2::new(origin.x, origin.y),
        unit.to_radians(origin.theta),
    )
}

/// Re-express a pose given in the frame with origin `from_origin` in the frame
/// with origin `to_origin`.
pub fn reframe(
    pose: &Movement,
    from_origin: &Movement,
    from_unit: AngleUnit,
    to_origin: &Movement,
    to_unit: AngleUnit,
) -> Movement {
    let from_frame = field_isometry(from_origin, from_unit);
    let to_frame = field_isometry(to_origin, to_unit);

    let field_point = from_frame.transform_point(&Point2::new(pose.x, pose.y));
    let local_point = to_frame.inverse_transform_point(&field_point);

    let heading_rad = from_unit.to_radians(from_origin.theta + pose.theta)
        - to_unit.to_radians(to_origin.theta);

    Movement::new(local_point.x, local_point.y, to_unit.from_radians(heading_rad))
}

/// Re-express a rate (velocity, error) given along the axes of one frame along
/// the axes of another.
///
/// Rates are free vectors so only the rotation between the frames applies.
pub fn rotate_rate(
    rate: &Movement,
    from_origin: &Movement,
    from_unit: AngleUnit,
    to_origin: &Movement,
    to_unit: AngleUnit,
) -> Movement {
    let rotation = UnitComplex::new(
        from_unit.to_radians(from_origin.theta) - to_unit.to_radians(to_origin.theta),
    );
    let planar = rotation * Vector2::new(rate.x, rate.y);

    Movement::new(planar.x, planar.y, to_unit.from_unit(from_unit, rate.theta))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
