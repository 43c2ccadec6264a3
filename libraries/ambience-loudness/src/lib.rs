//! Loudness analysis and normalization for Ambience
//!
//! This crate provides:
//! - Integrated loudness (LUFS) per ITU-R BS.1770-4 (K-weighting, two-stage gating)
//! - True peak estimation with 4x oversampling
//! - A normalization gain toward -27 LUFS with a limiter decision
//! - Symphonia-based decoding of analysis input
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ AudioSource │ ──► │  Processor   │ ──► │   Gating     │ ──► │             │
//! └─────────────┘     │ (K-weighting)│     └──────────────┘     │    Gain     │
//!        │            └──────────────┘                          │ Calculator  │
//!        │            ┌──────────────┐                          │             │
//!        └──────────► │  True Peak   │ ───────────────────────► │             │
//!                     └──────────────┘                          └─────────────┘
//!                                                                      │
//!                                                                      ▼
//!                                                           AudioAnalysisResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ambience_loudness::LoudnessAnalyzer;
//!
//! let result = LoudnessAnalyzer::new().analyze_file("rain.flac")?;
//! println!("Integrated loudness: {:?} LUFS", result.lufs);
//! println!("Gain: {:.2} dB", result.gain_db());
//! ```

#![forbid(unsafe_code)]

mod analyzer;
pub mod biquad;
mod decoder;
mod error;
pub mod gain;
pub mod gating;
pub mod kweighting;
pub mod processor;
mod source;
pub mod true_peak;

pub use analyzer::{AudioAnalysisResult, LoudnessAnalyzer};
pub use decoder::decode_file;
pub use error::{LoudnessError, Result};
pub use gain::{GainCalculator, NormalizationGain};
pub use source::{AudioSource, PcmBuffer};

/// Target integrated loudness for playback
pub const TARGET_LUFS: f64 = -27.0;

/// Material measured below this loudness is too quiet to trust
pub const MIN_LUFS_FLOOR: f64 = -50.0;

/// Maximum normalization gain in dB
pub const MAX_GAIN_DB: f64 = 18.0;

/// True-peak ceiling in dBTP
pub const TRUE_PEAK_CEILING_DBTP: f64 = -1.0;

pub use gating::{ABSOLUTE_GATE_LUFS, RELATIVE_GATE_OFFSET};
pub use processor::WINDOW_FRAMES;
