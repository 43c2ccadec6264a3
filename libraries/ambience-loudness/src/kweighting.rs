//! K-weighting filter bank (ITU-R BS.1770-4)
//!
//! Two cascaded biquads approximate the loudness perception of the ear:
//! 1. Pre-filter: high shelf, +4 dB above ~1.7 kHz
//! 2. RLB filter: high-pass around 38 Hz
//!
//! The coefficients are the 48 kHz values from BS.1770-4 Table 1 and are
//! used unchanged at every sample rate.

use crate::biquad::{self, BiquadCoefficients};
use tracing::debug;

/// Filtered power below this value marks quiet or silent input
pub const QUIET_POWER_THRESHOLD: f64 = 1e-10;

/// Fixed coefficient set for both K-weighting stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KWeightingCoefficients {
    /// Shelving pre-filter
    pub pre_filter: BiquadCoefficients,
    /// Revised low-frequency B-curve (high-pass)
    pub rlb_filter: BiquadCoefficients,
}

/// BS.1770-4 coefficients
pub const K_WEIGHTING: KWeightingCoefficients = KWeightingCoefficients {
    pre_filter: BiquadCoefficients::new(
        [1.53512485958697, -2.69169618940638, 1.19839281085285],
        [1.0, -1.69065929318241, 0.73248077421585],
    ),
    rlb_filter: BiquadCoefficients::new(
        [1.0, -2.0, 1.0],
        [1.0, -1.99004745483398, 0.99007225036621],
    ),
};

/// Channel weighting: 1.0 for the first two channels, 1.41 for surrounds
pub fn channel_weight(channel_index: usize) -> f64 {
    if channel_index < 2 {
        1.0
    } else {
        1.41
    }
}

/// K-weight one channel window and return its weighted mean-square power
///
/// Sub-threshold power is reported through tracing and otherwise passed
/// through as-is; it is not an error.
pub fn weighted_channel_power(samples: &[f32], channel_index: usize) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let shelved = biquad::apply(&input, &K_WEIGHTING.pre_filter);
    let filtered = biquad::apply(&shelved, &K_WEIGHTING.rlb_filter);

    let sum_of_squares: f64 = filtered.iter().map(|s| s * s).sum();
    let power = sum_of_squares / filtered.len() as f64;

    if power < QUIET_POWER_THRESHOLD {
        debug!(
            channel = channel_index,
            power, "K-weighted power below threshold (quiet or silent input)"
        );
    }

    power * channel_weight(channel_index)
}
