//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Clamp a value into the symmetric range `[-limit, +limit]`.
///
/// The sign of `limit` is ignored.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float
{
    let limit = limit.abs();
    clamp(value, -limit, limit)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5f64, -1f64, 1f64), 1f64);
        assert_eq!(clamp(-5f64, -1f64, 1f64), -1f64);
        assert_eq!(clamp(0.5f64, -1f64, 1f64), 0.5f64);

        assert_eq!(clamp_abs(3f64, -2f64), 2f64);
        assert_eq!(clamp_abs(-3f64, 2f64), -2f64);
    }
}
