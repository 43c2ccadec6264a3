//! Normalization gain decision
//!
//! Gain Calculation
//!
//! - Gain = Target (-27 LUFS) - Integrated Loudness, capped at +18 dB
//! - No change for material already at/above target or below -50 LUFS
//! - Limiter flag when `true_peak + gain` would exceed -1 dBTP
//!
//! The full gain is always applied; limiting is left to the playback layer.

use crate::{MAX_GAIN_DB, MIN_LUFS_FLOOR, TARGET_LUFS, TRUE_PEAK_CEILING_DBTP};

/// Decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Linear amplitude to decibels
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.log10()
}

/// Gain decided for one asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationGain {
    /// Gain in dB (0.0 when no change is applied)
    pub gain_db: f64,
    /// Whether the playback layer must limit to stay under the ceiling
    pub needs_limiter: bool,
}

impl NormalizationGain {
    /// Unity gain, no limiting
    pub const UNITY: Self = Self {
        gain_db: 0.0,
        needs_limiter: false,
    };

    /// Linear multiplier for this gain
    pub fn linear(&self) -> f64 {
        db_to_linear(self.gain_db)
    }
}

/// Computes normalization gains toward a target loudness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainCalculator {
    target_lufs: f64,
    min_lufs: f64,
    max_gain_db: f64,
    ceiling_dbtp: f64,
}

impl Default for GainCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl GainCalculator {
    /// Calculator with the standard constants
    pub fn new() -> Self {
        Self {
            target_lufs: TARGET_LUFS,
            min_lufs: MIN_LUFS_FLOOR,
            max_gain_db: MAX_GAIN_DB,
            ceiling_dbtp: TRUE_PEAK_CEILING_DBTP,
        }
    }

    /// Target loudness in LUFS
    pub fn target_lufs(&self) -> f64 {
        self.target_lufs
    }

    /// Gain in dB toward the target for a measured loudness
    pub fn required_gain_db(&self, measured_lufs: f64) -> f64 {
        if !measured_lufs.is_finite()
            || measured_lufs >= self.target_lufs
            || measured_lufs < self.min_lufs
        {
            return 0.0;
        }

        (self.target_lufs - measured_lufs).min(self.max_gain_db)
    }

    /// Whether applying `gain_db` pushes the true peak over the ceiling
    pub fn needs_limiter(&self, true_peak_dbtp: Option<f64>, gain_db: f64) -> bool {
        match true_peak_dbtp {
            Some(peak) if peak.is_finite() => peak + gain_db > self.ceiling_dbtp,
            _ => false,
        }
    }

    /// Gain decision from integrated loudness and true peak
    pub fn calculate(&self, measured_lufs: f64, true_peak_dbtp: Option<f64>) -> NormalizationGain {
        let gain_db = self.required_gain_db(measured_lufs);
        NormalizationGain {
            gain_db,
            needs_limiter: self.needs_limiter(true_peak_dbtp, gain_db),
        }
    }

    /// Fallback when no integrated loudness could be measured
    ///
    /// Raises the sample peak to the ceiling, capped at the maximum gain.
    /// Never attenuates; silence yields unity gain.
    pub fn peak_fallback(&self, sample_peak: Option<f64>, true_peak_dbtp: Option<f64>) -> NormalizationGain {
        let Some(peak) = sample_peak.filter(|p| *p > 0.0 && p.is_finite()) else {
            return NormalizationGain::UNITY;
        };

        let gain_db = (self.ceiling_dbtp - linear_to_db(peak)).clamp(0.0, self.max_gain_db);
        NormalizationGain {
            gain_db,
            needs_limiter: self.needs_limiter(true_peak_dbtp, gain_db),
        }
    }
}
