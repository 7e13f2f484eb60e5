//! Simulated fiducial locator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use log::debug;

use crate::loc::{reframe, LocError, Locator, LocatorKind, Odometry};
use crate::movement::{AngleUnit, Movement, ANGLE_UNIT};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fiducial-style locator which sees the simulated pose from its own frame.
///
/// The locator can be switched off, or set to drop out after a number of
/// readings, to exercise fallback to odometry.
#[derive(Debug)]
pub struct SimLocator {
    name: String,
    kind: LocatorKind,
    origin: Movement,
    unit: AngleUnit,

    /// The ground truth pose
    truth: Arc<Odometry>,

    active: AtomicBool,
    reads: AtomicUsize,
    drop_out_after: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimLocator {
    /// Create an active absolute locator whose frame is at `origin` in the
    /// field.
    pub fn new(name: &str, origin: Movement, truth: Arc<Odometry>) -> Self {
        Self {
            name: name.to_string(),
            kind: LocatorKind::AbsolutePosition,
            origin,
            unit: ANGLE_UNIT,
            truth,
            active: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
            drop_out_after: None,
        }
    }

    pub fn with_kind(mut self, kind: LocatorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_angle_unit(mut self, unit: AngleUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Become inactive once `num_reads` readings have been taken.
    pub fn with_drop_out_after(mut self, num_reads: usize) -> Self {
        self.drop_out_after = Some(num_reads);
        self
    }

    pub fn set_active(&self, active: bool) {
        debug!("{} active: {}", self.name, active);
        self.active.store(active, Ordering::Release);
    }

    /// Number of readings taken so far.
    fn reads(&self) -> usize {
        self.reads.load(Ordering::Acquire)
    }
}

impl Locator for SimLocator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LocatorKind {
        self.kind
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self.drop_out_after.map_or(true, |limit| self.reads() < limit)
    }

    fn get_location(&self) -> Result<Movement, LocError> {
        if !self.is_active() {
            return Err(LocError::NoReading(self.name.clone()));
        }

        self.reads.fetch_add(1, Ordering::AcqRel);

        Ok(reframe(
            &self.truth.pose(),
            &self.truth.frame_origin(),
            self.truth.angle_unit(),
            &self.origin,
            self.unit,
        ))
    }

    fn angle_unit(&self) -> AngleUnit {
        self.unit
    }

    fn frame_origin(&self) -> Movement {
        self.origin
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sees_truth_from_own_frame() {
        let truth = Arc::new(Odometry::new("odometry", Movement::new(1.0, 0.0, 0.0)));
        truth.set_pose(Movement::new(2.0, 0.0, 45.0));

        let camera = SimLocator::new("camera", Movement::new(3.0, -1.0, 0.0), truth);

        assert_eq!(camera.get_location().unwrap(), Movement::new(0.0, 1.0, 45.0));
    }

    #[test]
    fn test_drop_out() {
        let truth = Arc::new(Odometry::new("odometry", Movement::zero()));
        let camera = SimLocator::new("camera", Movement::zero(), truth).with_drop_out_after(2);

        assert!(camera.is_active());
        camera.get_location().unwrap();
        camera.get_location().unwrap();

        assert!(!camera.is_active());
        assert!(matches!(camera.get_location(), Err(LocError::NoReading(_))));
        assert_eq!(camera.reads(), 2);
    }

    #[test]
    fn test_toggle() {
        let truth = Arc::new(Odometry::new("odometry", Movement::zero()));
        let camera = SimLocator::new("camera", Movement::zero(), truth)
            .with_kind(LocatorKind::NoAbsolutePosition);

        assert_eq!(camera.kind(), LocatorKind::NoAbsolutePosition);

        camera.set_active(false);
        assert!(!camera.is_active());
        assert!(camera.get_location().is_err());

        camera.set_active(true);
        assert!(camera.get_location().is_ok());
    }
}
