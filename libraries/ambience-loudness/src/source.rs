//! Decoded PCM input for analysis
//!
//! The analyzer only needs random access to frame ranges of decoded audio.
//! [`AudioSource`] captures that capability; [`PcmBuffer`] is the in-memory
//! implementation produced by the decoder and used in tests.

use crate::error::{LoudnessError, Result};

/// Supported sample rate range (Hz)
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 8000..=384000;

/// Supported channel count range
pub const CHANNEL_RANGE: std::ops::RangeInclusive<usize> = 1..=8;

/// Decoded audio with random-access frame reads
pub trait AudioSource: Send + Sync {
    /// Number of channels
    fn channels(&self) -> usize;

    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Total number of frames
    fn total_frames(&self) -> u64;

    /// Read up to `count` frames starting at `start`, one vector per channel
    ///
    /// Reads that run past the end are truncated. A `start` at or beyond
    /// the end of a non-empty source is an error.
    fn read_frames(&self, start: u64, count: usize) -> Result<Vec<Vec<f32>>>;

    /// Duration in seconds
    fn duration_seconds(&self) -> f64 {
        self.total_frames() as f64 / f64::from(self.sample_rate())
    }
}

fn validate_format(sample_rate: u32, channels: usize) -> Result<()> {
    if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
        return Err(LoudnessError::InvalidSampleRate(sample_rate));
    }
    if !CHANNEL_RANGE.contains(&channels) {
        return Err(LoudnessError::InvalidChannelCount(channels));
    }
    Ok(())
}

/// In-memory planar PCM
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    /// Create from planar channel buffers of equal length
    pub fn from_planar(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        validate_format(sample_rate, channels.len())?;

        let expected = channels[0].len();
        if let Some((channel, data)) = channels
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != expected)
        {
            return Err(LoudnessError::ChannelLengthMismatch {
                channel,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Create from interleaved samples (L R L R... for stereo)
    pub fn from_interleaved(sample_rate: u32, channels: usize, samples: &[f32]) -> Result<Self> {
        validate_format(sample_rate, channels)?;

        if samples.len() % channels != 0 {
            return Err(LoudnessError::InterleavedLength {
                samples: samples.len(),
                channels,
            });
        }

        let frames = samples.len() / channels;
        let mut planar = vec![Vec::with_capacity(frames); channels];
        for frame in samples.chunks_exact(channels) {
            for (channel, &sample) in planar.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Ok(Self {
            sample_rate,
            channels: planar,
        })
    }

    /// Borrow one channel's samples
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

impl AudioSource for PcmBuffer {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_frames(&self) -> u64 {
        self.channels.first().map_or(0, |c| c.len() as u64)
    }

    fn read_frames(&self, start: u64, count: usize) -> Result<Vec<Vec<f32>>> {
        let total = self.total_frames();
        if start >= total && !(start == 0 && total == 0) {
            return Err(LoudnessError::FrameOutOfRange { start, total });
        }

        let begin = start as usize;
        let end = begin.saturating_add(count).min(total as usize);
        Ok(self
            .channels
            .iter()
            .map(|channel| channel[begin..end].to_vec())
            .collect())
    }
}
