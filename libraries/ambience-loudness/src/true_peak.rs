//! True-peak estimation with 4x linear-interpolation oversampling
//!
//! Linear interpolation is a cheap approximation of inter-sample peak
//! reconstruction. It is good enough to decide whether a gain is safe but
//! is not a BS.1770 compliant true-peak meter.
//!
//! The same pass records the sample peak and RMS level of the source.

use crate::error::Result;
use crate::processor::for_each_window;
use crate::source::AudioSource;

/// Oversampling factor
pub const OVERSAMPLING: usize = 4;

/// Oversample one channel window by linear interpolation
///
/// For each consecutive pair `(s1, s2)` this emits `s1, s1+d, s1+2d, s1+3d`
/// with `d = (s2 - s1) / 4`. The final sample is emitted as-is.
pub fn oversample_4x(samples: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() * OVERSAMPLING);

    for pair in samples.windows(2) {
        let (s1, s2) = (pair[0], pair[1]);
        let delta = (s2 - s1) / OVERSAMPLING as f32;
        for step in 0..OVERSAMPLING {
            out.push(s1 + delta * step as f32);
        }
    }
    if let Some(&last) = samples.last() {
        out.push(last);
    }

    out
}

/// Linear peak to dBTP, `-inf` for a zero peak
pub fn linear_to_dbtp(peak: f64) -> f64 {
    if peak > 0.0 {
        20.0 * peak.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Peak statistics gathered over the whole source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakStats {
    /// Oversampled peak (linear)
    pub true_peak: f64,
    /// Maximum absolute sample value (linear)
    pub sample_peak: f64,
    /// Root mean square over all samples of all channels (linear)
    pub rms: f64,
    /// Number of samples scanned
    pub samples: u64,
}

impl PeakStats {
    /// True peak in dBTP (`-inf` for silence)
    pub fn true_peak_dbtp(&self) -> f64 {
        linear_to_dbtp(self.true_peak)
    }
}

/// Scan the source window by window, channel by channel
pub fn scan_peaks(source: &dyn AudioSource) -> Result<PeakStats> {
    let mut true_peak = 0.0_f32;
    let mut sample_peak = 0.0_f32;
    let mut sum_of_squares = 0.0_f64;
    let mut samples = 0_u64;

    for_each_window(source, |window| {
        for channel in window {
            let oversampled_peak = oversample_4x(channel)
                .iter()
                .fold(0.0_f32, |peak, s| peak.max(s.abs()));
            true_peak = true_peak.max(oversampled_peak);

            for &sample in channel {
                sample_peak = sample_peak.max(sample.abs());
                sum_of_squares += f64::from(sample) * f64::from(sample);
            }
            samples += channel.len() as u64;
        }
    })?;

    let rms = if samples > 0 {
        (sum_of_squares / samples as f64).sqrt()
    } else {
        0.0
    };

    Ok(PeakStats {
        true_peak: f64::from(true_peak),
        sample_peak: f64::from(sample_peak),
        rms,
        samples,
    })
}
