//! Loudness analysis facade
//!
//! Runs the windowed loudness pass and the peak pass over the same source,
//! integrates the window measurements, and decides the normalization gain.

use crate::decoder::decode_file;
use crate::error::{LoudnessError, Result};
use crate::gain::{linear_to_db, GainCalculator, NormalizationGain};
use crate::gating::integrate;
use crate::processor::measure_windows;
use crate::source::AudioSource;
use crate::true_peak::scan_peaks;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of analyzing one asset
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAnalysisResult {
    /// Integrated loudness in LUFS, `None` when nothing could be measured
    pub lufs: Option<f64>,
    /// Linear gain to reach the target loudness
    pub normalization_factor: f64,
    /// Sample peak (linear, 0.0-1.0)
    pub peak_level: Option<f64>,
    /// RMS level (linear, 0.0-1.0)
    pub rms_level: Option<f64>,
    /// Oversampled peak in dBTP, `None` for silence
    pub true_peak_dbtp: Option<f64>,
    /// Whether the playback layer should limit after applying the gain
    pub needs_limiter: bool,
}

impl AudioAnalysisResult {
    /// Sample peak in dBFS
    pub fn peak_dbfs(&self) -> Option<f64> {
        self.peak_level.filter(|p| *p > 0.0).map(linear_to_db)
    }

    /// RMS level in dBFS
    pub fn rms_dbfs(&self) -> Option<f64> {
        self.rms_level.filter(|r| *r > 0.0).map(linear_to_db)
    }

    /// Normalization gain in dB
    pub fn gain_db(&self) -> f64 {
        if self.normalization_factor > 0.0 {
            linear_to_db(self.normalization_factor)
        } else {
            0.0
        }
    }
}

impl fmt::Display for AudioAnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lufs {
            Some(lufs) => write!(f, "Loudness: {:.1} LUFS", lufs)?,
            None => write!(f, "Loudness: unmeasured")?,
        }
        if let Some(peak) = self.true_peak_dbtp {
            write!(f, ", True Peak: {:.1} dBTP", peak)?;
        }
        write!(
            f,
            ", Gain: {:+.2} dB{}",
            self.gain_db(),
            if self.needs_limiter { " (limiter)" } else { "" }
        )
    }
}

/// Loudness analyzer
///
/// # Example
///
/// ```ignore
/// use ambience_loudness::{LoudnessAnalyzer, PcmBuffer};
///
/// let source = PcmBuffer::from_interleaved(48000, 2, &samples)?;
/// let result = LoudnessAnalyzer::new().analyze(&source)?;
/// println!("{}", result);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoudnessAnalyzer {
    gain: GainCalculator,
}

impl LoudnessAnalyzer {
    /// Create an analyzer with the standard target and limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Gain calculator in use
    pub fn gain_calculator(&self) -> &GainCalculator {
        &self.gain
    }

    /// Analyze a decoded source
    ///
    /// # Errors
    /// Returns error if the source is empty or a frame read fails
    pub fn analyze(&self, source: &dyn AudioSource) -> Result<AudioAnalysisResult> {
        if source.total_frames() == 0 {
            return Err(LoudnessError::NoFrames);
        }

        let (measurements, peaks) = rayon::join(|| measure_windows(source), || scan_peaks(source));
        let measurements = measurements?;
        let peaks = peaks?;

        let lufs = integrate(&measurements);
        let true_peak_dbtp = Some(peaks.true_peak_dbtp()).filter(|p| p.is_finite());
        let peak_level = Some(peaks.sample_peak);

        let decision = match lufs {
            Some(lufs) => self.gain.calculate(lufs, true_peak_dbtp),
            None => {
                debug!("No gated loudness, falling back to peak normalization");
                self.gain.peak_fallback(peak_level, true_peak_dbtp)
            }
        };

        let result = Self::build_result(lufs, decision, peak_level, Some(peaks.rms), true_peak_dbtp);

        debug!(
            windows = measurements.len(),
            channels = source.channels(),
            sample_rate = source.sample_rate(),
            "{}",
            result
        );

        Ok(result)
    }

    fn build_result(
        lufs: Option<f64>,
        decision: NormalizationGain,
        peak_level: Option<f64>,
        rms_level: Option<f64>,
        true_peak_dbtp: Option<f64>,
    ) -> AudioAnalysisResult {
        AudioAnalysisResult {
            lufs,
            normalization_factor: decision.linear(),
            peak_level,
            rms_level,
            true_peak_dbtp,
            needs_limiter: decision.needs_limiter,
        }
    }

    /// Decode and analyze an audio file
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<AudioAnalysisResult> {
        let path = path.as_ref();
        let source = decode_file(path)?;
        let result = self.analyze(&source)?;
        info!("Analyzed {}: {}", path.display(), result);
        Ok(result)
    }

    /// Analyze independent files on a bounded worker pool
    ///
    /// Results come back in input order, one per path. `workers` is clamped
    /// to 1..=16.
    pub fn analyze_batch(
        &self,
        paths: &[PathBuf],
        workers: usize,
    ) -> Result<Vec<(PathBuf, Result<AudioAnalysisResult>)>> {
        let workers = workers.clamp(1, 16);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("loudness-analysis-{}", i))
            .build()
            .map_err(|e| LoudnessError::WorkerPool(e.to_string()))?;

        info!("Analyzing {} files with {} workers", paths.len(), workers);

        let results = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    let result = self.analyze_file(path);
                    if let Err(e) = &result {
                        warn!("Analysis failed for {}: {}", path.display(), e);
                    }
                    (path.clone(), result)
                })
                .collect()
        });

        Ok(results)
    }
}
