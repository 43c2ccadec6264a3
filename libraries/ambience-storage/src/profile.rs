//! Playback profiles
//!
//! A profile is the cached analysis of one audio asset. Profiles are never
//! mutated; a changed asset gets a freshly built profile that replaces the
//! old one in the store.

use crate::error::{Result, StorageError};
use ambience_loudness::AudioAnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Analysis algorithm version written into new profiles
pub const ANALYSIS_VERSION: &str = "1.0";

/// Value persisted for loudness or peak that could not be measured
pub const UNMEASURED_FLOOR_DB: f64 = -100.0;

/// Cached loudness analysis for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackProfile {
    /// Asset identifier (file name)
    #[serde(rename = "id", alias = "filename")]
    pub asset_id: String,

    /// Content hash of the asset at analysis time
    #[serde(rename = "fileHash", default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,

    /// Integrated loudness in LUFS
    #[serde(rename = "integratedLUFS")]
    pub integrated_lufs: f64,

    /// True peak in dBTP
    #[serde(rename = "truePeakdBTP")]
    pub true_peak_dbtp: f64,

    /// Gain to apply in dB, validated against the true-peak ceiling at creation
    #[serde(rename = "gainDB")]
    pub gain_db: f64,

    /// Whether playback must limit after applying `gain_db`
    #[serde(rename = "needsLimiter")]
    pub needs_limiter: bool,

    /// When the analysis ran
    #[serde(rename = "analysisDate")]
    pub analysis_date: DateTime<Utc>,

    /// Algorithm version that produced the profile
    #[serde(rename = "analysisVersion")]
    pub analysis_version: String,
}

fn finite_or_floor(value: Option<f64>) -> f64 {
    value
        .filter(|v| v.is_finite())
        .unwrap_or(UNMEASURED_FLOOR_DB)
}

impl PlaybackProfile {
    /// Build a profile from a finished analysis
    ///
    /// Unmeasured loudness or peak is stored as [`UNMEASURED_FLOOR_DB`] so the
    /// persisted record never holds NaN or infinity.
    pub fn from_analysis(
        asset_id: impl Into<String>,
        file_hash: Option<String>,
        analysis: &AudioAnalysisResult,
    ) -> Self {
        let gain_db = analysis.gain_db();

        Self {
            asset_id: asset_id.into(),
            file_hash,
            integrated_lufs: finite_or_floor(analysis.lufs),
            true_peak_dbtp: finite_or_floor(analysis.true_peak_dbtp),
            gain_db: if gain_db.is_finite() { gain_db } else { 0.0 },
            needs_limiter: analysis.needs_limiter,
            analysis_date: Utc::now(),
            analysis_version: ANALYSIS_VERSION.to_string(),
        }
    }

    /// Linear gain multiplier for the playback engine
    pub fn linear_gain(&self) -> f64 {
        10.0_f64.powf(self.gain_db / 20.0)
    }

    /// Check that every numeric field can be written to the store file
    ///
    /// JSON has no NaN or infinity; serde_json writes them as `null`, which
    /// would make the whole file unreadable on the next load.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("integratedLUFS", self.integrated_lufs),
            ("truePeakdBTP", self.true_peak_dbtp),
            ("gainDB", self.gain_db),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some(&(field, _)) => Err(StorageError::InvalidProfile {
                asset_id: self.asset_id.clone(),
                field,
            }),
            None => Ok(()),
        }
    }

    /// Whether this profile was produced by the current algorithm
    pub fn is_current_version(&self) -> bool {
        self.analysis_version == ANALYSIS_VERSION
    }
}
