//! Position control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for position control, shared by all three axes.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Outputs whose PID part (excluding feed-forward) is smaller than this
    /// are replaced by the feed-forward alone.
    pub minimum_abs_power: f64,

    /// Limit on the magnitude of the integral accumulation. Unlimited if not
    /// set.
    pub integral_sum_limit: Option<f64>,

    /// Weight of the previous estimate in the derivative's low pass filter,
    /// must be in (0, 1). The derivative is unfiltered if not set.
    pub low_pass_filter: Option<f64>,

    /// Limit on the magnitude of each axis output. Unlimited if not set.
    ///
    /// Not applied inside the deadband, where the output is the feed forward
    /// alone.
    pub max_abs_power: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.1,
            k_i: 0.0,
            k_d: 0.0,
            minimum_abs_power: 0.1,
            integral_sum_limit: Some(1.0),
            low_pass_filter: Some(0.8),
            max_abs_power: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_deserialise() {
        let params: Params = util::params::from_str(
            "k_p = 0.2\nk_i = 0.01\nk_d = 0.0\nminimum_abs_power = 0.05\nlow_pass_filter = 0.5\n",
        )
        .unwrap();

        assert_eq!(params.k_p, 0.2);
        assert_eq!(params.k_i, 0.01);
        assert_eq!(params.minimum_abs_power, 0.05);
        assert_eq!(params.low_pass_filter, Some(0.5));

        // Missing limits are unlimited
        assert_eq!(params.integral_sum_limit, None);
        assert_eq!(params.max_abs_power, None);
    }

    #[test]
    fn test_missing_gain_is_an_error() {
        assert!(util::params::from_str::<Params>("k_p = 0.2\n").is_err());
    }
}
