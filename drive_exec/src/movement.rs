//! # Movement
//!
//! A movement is a point in the robot's plane of motion together with a
//! heading: `(x, y, theta)`. The same type is used for poses, errors between
//! poses, and velocity commands.
//!
//! Movements are compared with a tolerance of [`EPSILON`] on every component
//! rather than exactly, so two movements which differ by less than `EPSILON`
//! on all of `x`, `y` and `theta` are equal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used for equality and zero tests.
pub const EPSILON: f64 = 0.001;

/// The unit of rotation used by default for `theta`.
pub const ANGLE_UNIT: AngleUnit = AngleUnit::Degrees;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and heading, or a rate of change of one.
///
/// All arithmetic returns a new value, operands are never modified.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Movement {
    pub x: f64,
    pub y: f64,

    /// Heading, in the unit of whichever locator the movement belongs to
    /// ([`ANGLE_UNIT`] unless stated otherwise).
    #[serde(default)]
    pub theta: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Units in which an angle can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Movement {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    /// A movement with no rotation.
    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    /// `<0, 0, 0>`
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Determines if the movement is small enough to be considered zero.
    pub fn is_zero(&self) -> bool {
        self.x.abs() < EPSILON
            && self.y.abs() < EPSILON
            && self.theta.abs() < EPSILON
    }

    /// Component-wise sum of the two movements.
    pub fn add(self, addend: Movement) -> Movement {
        Movement::new(
            self.x + addend.x,
            self.y + addend.y,
            self.theta + addend.theta,
        )
    }

    pub fn negate(self) -> Movement {
        self.multiply(-1.0)
    }

    /// Subtract `subtrahend` from this movement.
    pub fn subtract(self, subtrahend: Movement) -> Movement {
        self.add(subtrahend.negate())
    }

    /// Scale every component by `factor`.
    pub fn multiply(self, factor: f64) -> Movement {
        Movement::new(self.x * factor, self.y * factor, self.theta * factor)
    }
}

impl PartialEq for Movement {
    fn eq(&self, other: &Self) -> bool {
        self.subtract(*other).is_zero()
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.theta)
    }
}

impl Add for Movement {
    type Output = Movement;

    fn add(self, rhs: Movement) -> Movement {
        Movement::add(self, rhs)
    }
}

impl Sub for Movement {
    type Output = Movement;

    fn sub(self, rhs: Movement) -> Movement {
        self.subtract(rhs)
    }
}

impl Neg for Movement {
    type Output = Movement;

    fn neg(self) -> Movement {
        self.negate()
    }
}

impl Mul<f64> for Movement {
    type Output = Movement;

    fn mul(self, rhs: f64) -> Movement {
        self.multiply(rhs)
    }
}

impl AngleUnit {
    /// Convert an angle in this unit to radians.
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_radians(),
            AngleUnit::Radians => value,
        }
    }

    /// Convert an angle in radians to this unit.
    pub fn from_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_degrees(),
            AngleUnit::Radians => value,
        }
    }

    /// Convert an angle in `unit` to this unit.
    pub fn from_unit(self, unit: AngleUnit, value: f64) -> f64 {
        if self == unit {
            value
        } else {
            self.from_radians(unit.to_radians(value))
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn samples() -> Vec<Movement> {
        vec![
            Movement::zero(),
            Movement::new(12.0, 0.0, 0.0),
            Movement::new(-3.5, 7.25, 90.0),
            Movement::new(1e6, -1e6, 1e-4),
            Movement::new(0.1, 0.2, 0.3),
        ]
    }

    #[test]
    fn test_add_negate_is_zero() {
        for m in samples() {
            assert!(m.add(m.negate()).is_zero(), "{} + -{} not zero", m, m);
            assert!((m + -m).is_zero());
            assert!(m.subtract(m).is_zero());
        }
    }

    #[test]
    fn test_tolerance_equality() {
        let a = Movement::new(1.0, 2.0, 3.0);

        // Within epsilon on every component
        assert_eq!(a, Movement::new(1.0009, 1.9991, 3.0005));

        // Epsilon or more on any single component
        assert_ne!(a, Movement::new(1.0011, 2.0, 3.0));
        assert_ne!(a, Movement::new(1.0, 2.0011, 3.0));
        assert_ne!(a, Movement::new(1.0, 2.0, 2.9989));
        assert_ne!(a, Movement::new(1.0, 2.0, 3.5));
    }

    #[test]
    fn test_is_zero() {
        assert!(Movement::zero().is_zero());
        assert!(Movement::new(0.0009, -0.0009, 0.0009).is_zero());
        assert!(!Movement::new(0.0, 0.0, EPSILON).is_zero());
        assert!(!Movement::new(-EPSILON, 0.0, 0.0).is_zero());
    }

    #[test]
    fn test_arithmetic_is_pure() {
        let a = Movement::new(1.0, 2.0, 3.0);
        let b = Movement::new(0.5, -1.0, 10.0);

        let sum = a.add(b);
        let diff = a.subtract(b);
        let scaled = a.multiply(2.0);

        assert_eq!(sum, Movement::new(1.5, 1.0, 13.0));
        assert_eq!(diff, Movement::new(0.5, 3.0, -7.0));
        assert_eq!(scaled, Movement::new(2.0, 4.0, 6.0));
        assert_eq!(a * 2.0, scaled);
        assert_eq!(a - b, diff);

        // Operands untouched
        assert_eq!(a, Movement::new(1.0, 2.0, 3.0));
        assert_eq!(b, Movement::new(0.5, -1.0, 10.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Movement::new(1.5, -2.0, 90.0).to_string(), "<1.5, -2, 90>");
    }

    #[test]
    fn test_angle_units() {
        assert!((AngleUnit::Radians.from_unit(AngleUnit::Degrees, 180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((AngleUnit::Degrees.from_unit(AngleUnit::Radians, std::f64::consts::FRAC_PI_2) - 90.0).abs() < 1e-12);
        assert_eq!(AngleUnit::Degrees.from_unit(AngleUnit::Degrees, 45.0), 45.0);
    }

    #[test]
    fn test_deserialise_planar() {
        let m: Movement = util::params::from_str("x = 12.0\ny = 0.5\n").unwrap();
        assert_eq!(m, Movement::planar(12.0, 0.5));
    }

    #[test]
    fn test_deserialise_angle_unit() {
        #[derive(Deserialize)]
        struct Unit {
            unit: AngleUnit,
        }

        let u: Unit = util::params::from_str("unit = \"radians\"\n").unwrap();
        assert_eq!(u.unit, AngleUnit::Radians);
    }
}
