//! # Position controllers module
//!
//! This module provides the per-axis PID computation used by position
//! control.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::fmt;
use serde::Serialize;

// Internal
use util::maths::clamp_abs;

use super::Params;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Feed-forward term, a function of `(current, target)`.
pub type FeedForward = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tuning of a position controller.
///
/// The tuning is fixed for the duration of a drive. Build it with
/// [`PidConfig::from_params`], which validates the parameters.
pub struct PidConfig {
    k_p: f64,
    k_i: f64,
    k_d: f64,
    feed_forward: FeedForward,
    minimum_abs_power: f64,
    integral_sum_limit: Option<f64>,
    low_pass_filter: Option<f64>,
    max_abs_power: Option<f64>,
}

/// Controller state for a single axis, kept between iterations of one drive.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct MovementInfo {
    /// Error from the last iteration
    pub error: f64,

    /// Derivative of the error from the last iteration
    pub derivative: f64,

    /// The integral accumulation
    pub integral_sum: f64,

    /// Low pass filtered change in error
    pub filter_estimate: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PidConfigError {
    #[error("The low pass filter must be in (0, 1), got {0}")]
    InvalidLowPassFilter(f64),

    #[error("The minimum absolute power must be finite and non-negative, got {0}")]
    InvalidMinimumAbsPower(f64),

    #[error("The integral sum limit must be non-negative, got {0}")]
    InvalidIntegralSumLimit(f64),

    #[error("The maximum absolute power must be non-negative, got {0}")]
    InvalidMaxAbsPower(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidConfig {
    /// Create a new config from the parameters, with no feed-forward.
    pub fn from_params(params: &Params) -> Result<Self, PidConfigError> {
        if let Some(a) = params.low_pass_filter {
            // Also rejects NaN
            if !(a > 0.0 && a < 1.0) {
                return Err(PidConfigError::InvalidLowPassFilter(a));
            }
        }

        if !(params.minimum_abs_power >= 0.0 && params.minimum_abs_power.is_finite()) {
            return Err(PidConfigError::InvalidMinimumAbsPower(params.minimum_abs_power));
        }

        if let Some(limit) = params.integral_sum_limit {
            if !(limit >= 0.0) {
                return Err(PidConfigError::InvalidIntegralSumLimit(limit));
            }
        }

        if let Some(limit) = params.max_abs_power {
            if !(limit >= 0.0) {
                return Err(PidConfigError::InvalidMaxAbsPower(limit));
            }
        }

        Ok(Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            feed_forward: Box::new(|_, _| 0.0),
            minimum_abs_power: params.minimum_abs_power,
            integral_sum_limit: params.integral_sum_limit,
            low_pass_filter: params.low_pass_filter,
            max_abs_power: params.max_abs_power,
        })
    }

    /// Use the given feed-forward term instead of zero.
    pub fn with_feed_forward<F>(mut self, feed_forward: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.feed_forward = Box::new(feed_forward);
        self
    }
}

impl fmt::Debug for PidConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidConfig")
            .field("k_p", &self.k_p)
            .field("k_i", &self.k_i)
            .field("k_d", &self.k_d)
            .field("minimum_abs_power", &self.minimum_abs_power)
            .field("integral_sum_limit", &self.integral_sum_limit)
            .field("low_pass_filter", &self.low_pass_filter)
            .field("max_abs_power", &self.max_abs_power)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the controller output for one axis.
///
/// `dt` is the time in seconds since the previous call for this axis. If it
/// is zero, negative or not finite (e.g. on the first iteration of a drive)
/// there is no meaningful rate of change, so the derivative is zero and
/// neither the filter nor the integral are updated. The error is always
/// recorded so the next call has something to differentiate against.
///
/// Inside the deadband the output is exactly the feed forward, even if that
/// exceeds `max_abs_power`.
pub fn calc_velocity(
    info: &mut MovementInfo,
    config: &PidConfig,
    current: f64,
    target: f64,
    dt: f64,
) -> f64 {
    let last_error = info.error;
    info.error = target - current;

    if dt > 0.0 && dt.is_finite() {
        let delta_error = info.error - last_error;

        info.derivative = match config.low_pass_filter {
            Some(a) => {
                info.filter_estimate = a * info.filter_estimate + (1.0 - a) * delta_error;
                info.filter_estimate / dt
            }
            None => delta_error / dt,
        };

        info.integral_sum += info.error * dt;
    } else {
        info.derivative = 0.0;
    }

    // Anti-windup
    if let Some(limit) = config.integral_sum_limit {
        info.integral_sum = clamp_abs(info.integral_sum, limit);
    }

    let feed_forward = (config.feed_forward)(current, target);

    let power = config.k_p * info.error
        + config.k_i * info.integral_sum
        + config.k_d * info.derivative
        + feed_forward;

    // Deadband, the feed forward is passed through unclamped
    if (power - feed_forward).abs() < config.minimum_abs_power {
        return feed_forward;
    }

    match config.max_abs_power {
        Some(limit) => clamp_abs(power, limit),
        None => power,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn config(params: Params) -> PidConfig {
        PidConfig::from_params(&params).unwrap()
    }

    #[test]
    fn test_first_output() {
        let config = config(Params::default());
        let mut info = MovementInfo::default();

        let out = calc_velocity(&mut info, &config, 0.0, 12.0, 0.0);

        assert!((out - 1.2).abs() < 1e-12);
        assert_eq!(info.error, 12.0);
        assert_eq!(info.derivative, 0.0);
        assert_eq!(info.integral_sum, 0.0);
        assert_eq!(info.filter_estimate, 0.0);
    }

    #[test]
    fn test_zero_error_is_idempotent() {
        let config = config(Params {
            k_p: 1.0,
            k_i: 0.5,
            k_d: 0.2,
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        for &dt in [0.0, 0.02, 0.02, 1.0].iter() {
            assert_eq!(calc_velocity(&mut info, &config, 5.0, 5.0, dt), 0.0);
            assert_eq!(info.error, 0.0);
            assert_eq!(info.integral_sum, 0.0);
            assert_eq!(info.derivative, 0.0);
        }
    }

    #[test]
    fn test_anti_windup() {
        let limit = 0.25;
        let config = config(Params {
            k_p: 0.0,
            k_i: 1.0,
            integral_sum_limit: Some(limit),
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        for _ in 0..100 {
            calc_velocity(&mut info, &config, 0.0, 10.0, 0.1);
            assert!(info.integral_sum.abs() <= limit);
        }
        assert_eq!(info.integral_sum, limit);

        for _ in 0..100 {
            calc_velocity(&mut info, &config, 10.0, 0.0, 0.1);
            assert!(info.integral_sum.abs() <= limit);
        }
        assert_eq!(info.integral_sum, -limit);
    }

    #[test]
    fn test_unlimited_integral() {
        let config = config(Params {
            k_p: 0.0,
            k_i: 1.0,
            integral_sum_limit: None,
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        for _ in 0..10 {
            calc_velocity(&mut info, &config, 0.0, 10.0, 0.5);
        }
        assert!((info.integral_sum - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadband() {
        let config = config(Params {
            k_p: 1.0,
            minimum_abs_power: 0.5,
            ..Default::default()
        })
        .with_feed_forward(|_, _| 0.3);
        let mut info = MovementInfo::default();

        // PID part of 0.4 is inside the deadband, only feed-forward is output
        assert_eq!(calc_velocity(&mut info, &config, 0.0, 0.4, 0.0), 0.3);
        assert_eq!(calc_velocity(&mut info, &config, 0.0, -0.4, 0.0), 0.3);

        // Outside it the full output is kept
        assert!((calc_velocity(&mut info, &config, 0.0, 0.6, 0.0) - 0.9).abs() < 1e-12);
        assert!((calc_velocity(&mut info, &config, 0.0, -0.6, 0.0) + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_feed_forward_uses_current_and_target() {
        let config = config(Params {
            k_p: 0.0,
            ..Default::default()
        })
        .with_feed_forward(|current, target| 0.01 * target - 0.001 * current);
        let mut info = MovementInfo::default();

        let out = calc_velocity(&mut info, &config, 100.0, 50.0, 0.0);
        assert!((out - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_filtered_derivative() {
        let config = config(Params {
            k_p: 0.0,
            k_d: 1.0,
            low_pass_filter: Some(0.5),
            minimum_abs_power: 0.0,
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        calc_velocity(&mut info, &config, 0.0, 1.0, 0.0);

        // Error steps from 1 to 3, half of the step passes the filter
        let out = calc_velocity(&mut info, &config, 0.0, 3.0, 0.5);
        assert!((info.filter_estimate - 1.0).abs() < 1e-12);
        assert!((info.derivative - 2.0).abs() < 1e-12);
        assert!((out - 2.0).abs() < 1e-12);

        // No further change, the estimate decays
        calc_velocity(&mut info, &config, 0.0, 3.0, 0.5);
        assert!((info.filter_estimate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unfiltered_derivative() {
        let config = config(Params {
            k_p: 0.0,
            k_d: 1.0,
            low_pass_filter: None,
            minimum_abs_power: 0.0,
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        calc_velocity(&mut info, &config, 0.0, 1.0, 0.0);
        let out = calc_velocity(&mut info, &config, 0.0, 3.0, 0.5);

        assert!((out - 4.0).abs() < 1e-12);
        assert_eq!(info.filter_estimate, 0.0);
    }

    #[test]
    fn test_invalid_dt_is_guarded() {
        let config = config(Params {
            k_i: 1.0,
            k_d: 1.0,
            integral_sum_limit: None,
            ..Default::default()
        });

        for &dt in [0.0, -1.0, std::f64::NAN, std::f64::INFINITY].iter() {
            let mut info = MovementInfo::default();
            let out = calc_velocity(&mut info, &config, 0.0, 2.0, dt);

            assert!(out.is_finite());
            assert_eq!(info.derivative, 0.0);
            assert_eq!(info.integral_sum, 0.0);
            assert_eq!(info.filter_estimate, 0.0);
            assert_eq!(info.error, 2.0);
        }
    }

    #[test]
    fn test_max_abs_power() {
        let config = config(Params {
            k_p: 1.0,
            max_abs_power: Some(0.5),
            ..Default::default()
        });
        let mut info = MovementInfo::default();

        assert_eq!(calc_velocity(&mut info, &config, 0.0, 10.0, 0.0), 0.5);
        assert_eq!(calc_velocity(&mut info, &config, 0.0, -10.0, 0.0), -0.5);
        assert!((calc_velocity(&mut info, &config, 0.0, 0.3, 0.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_max_abs_power_skips_deadband() {
        let config = config(Params {
            max_abs_power: Some(0.1),
            ..Default::default()
        })
        .with_feed_forward(|_, _| 0.3);
        let mut info = MovementInfo::default();

        // Inside the deadband the feed forward is the output
        assert_eq!(calc_velocity(&mut info, &config, 0.0, 0.5, 0.0), 0.3);

        // Outside it the total is limited
        assert_eq!(calc_velocity(&mut info, &config, 0.0, 12.0, 0.0), 0.1);
    }

    #[test]
    fn test_invalid_params() {
        for &a in [0.0, 1.0, -0.5, 1.5, std::f64::NAN].iter() {
            assert!(matches!(
                PidConfig::from_params(&Params {
                    low_pass_filter: Some(a),
                    ..Default::default()
                }),
                Err(PidConfigError::InvalidLowPassFilter(_))
            ));
        }

        assert!(PidConfig::from_params(&Params {
            low_pass_filter: None,
            ..Default::default()
        })
        .is_ok());

        assert!(matches!(
            PidConfig::from_params(&Params {
                minimum_abs_power: -0.1,
                ..Default::default()
            }),
            Err(PidConfigError::InvalidMinimumAbsPower(_))
        ));
        assert!(matches!(
            PidConfig::from_params(&Params {
                integral_sum_limit: Some(-1.0),
                ..Default::default()
            }),
            Err(PidConfigError::InvalidIntegralSumLimit(_))
        ));
    }
}
