//! File decoding and batch analysis tests
//!
//! WAV fixtures are written with hound and read back through Symphonia.

use ambience_loudness::{decode_file, AudioSource, LoudnessAnalyzer, LoudnessError};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a 16-bit interleaved sine WAV file
fn write_sine_wav(path: &Path, sample_rate: u32, channels: u16, amplitude: f64, seconds: f64) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();

    let frames = (f64::from(sample_rate) * seconds) as usize;
    for i in 0..frames {
        let t = i as f64 / f64::from(sample_rate);
        let value = amplitude * (2.0 * PI * 1000.0 * t).sin();
        let sample = (value * f64::from(i16::MAX)) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }

    writer.finalize().unwrap();
}

fn fixture(dir: &TempDir, name: &str, amplitude: f64) -> PathBuf {
    let path = dir.path().join(name);
    write_sine_wav(&path, 48000, 2, amplitude, 2.5);
    path
}

#[test]
fn test_decode_wav_keeps_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("surround.wav");
    write_sine_wav(&path, 44100, 4, 0.5, 1.0);

    let source = decode_file(&path).unwrap();
    assert_eq!(source.channels(), 4);
    assert_eq!(source.sample_rate(), 44100);
    assert_eq!(source.total_frames(), 44100);
}

#[test]
fn test_decoded_samples_match_written_level() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "tone.wav", 0.5);

    let source = decode_file(&path).unwrap();
    let peak = source
        .channel(0)
        .unwrap()
        .iter()
        .fold(0.0_f32, |peak, s| peak.max(s.abs()));
    assert!((peak - 0.5).abs() < 1e-3, "peak {peak}");
}

#[test]
fn test_analyze_file() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "quiet.wav", 10.0_f64.powf(-35.0 / 20.0));

    let result = LoudnessAnalyzer::new().analyze_file(&path).unwrap();
    let lufs = result.lufs.unwrap();
    assert!((lufs - (-35.0)).abs() < 0.5, "got {lufs}");

    // About +8 dB toward -27 LUFS
    assert!((result.gain_db() - (-27.0 - lufs)).abs() < 1e-6);
}

#[test]
fn test_analyze_missing_file() {
    let result = LoudnessAnalyzer::new().analyze_file("/nonexistent/waves.wav");
    assert!(matches!(result, Err(LoudnessError::FileNotFound(_))));
}

#[test]
fn test_batch_preserves_order_and_isolates_failures() {
    let dir = TempDir::new().unwrap();
    let quiet = fixture(&dir, "a.wav", 0.01);
    let loud = fixture(&dir, "b.wav", 0.8);
    let missing = dir.path().join("missing.wav");

    let paths = vec![quiet.clone(), missing.clone(), loud.clone()];
    let results = LoudnessAnalyzer::new().analyze_batch(&paths, 2).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, quiet);
    assert_eq!(results[1].0, missing);
    assert_eq!(results[2].0, loud);

    assert!(results[0].1.is_ok());
    assert!(matches!(results[1].1, Err(LoudnessError::FileNotFound(_))));
    assert!(results[2].1.is_ok());

    let quiet_gain = results[0].1.as_ref().unwrap().gain_db();
    let loud_gain = results[2].1.as_ref().unwrap().gain_db();
    assert!(quiet_gain > loud_gain);
}
