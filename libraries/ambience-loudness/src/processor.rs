//! Chunked PCM processing
//!
//! Streams a source in fixed windows of [`WINDOW_FRAMES`] frames and emits
//! one loudness value per window. The window is counted in frames, not
//! seconds, so at 44.1 kHz a window spans ~1.09 s.

use crate::error::Result;
use crate::kweighting::weighted_channel_power;
use crate::source::AudioSource;
use tracing::debug;

/// Analysis window size in frames (1 second at 48 kHz)
pub const WINDOW_FRAMES: usize = 48_000;

/// Offset applied when converting K-weighted power to loudness
pub const LOUDNESS_OFFSET: f64 = -0.691;

/// Visit every window of the source in order, including a final partial one
pub(crate) fn for_each_window<F>(source: &dyn AudioSource, mut visit: F) -> Result<()>
where
    F: FnMut(&[Vec<f32>]),
{
    let total = source.total_frames();
    let mut start = 0_u64;

    while start < total {
        let window = source.read_frames(start, WINDOW_FRAMES)?;
        let frames = window.first().map_or(0, Vec::len);
        if frames == 0 {
            break;
        }
        visit(&window);
        start += frames as u64;
    }

    Ok(())
}

/// Loudness of a single window given its summed, weighted channel power
///
/// Returns `None` for zero power so silent windows contribute nothing.
pub fn window_loudness(total_power: f64) -> Option<f64> {
    (total_power > 0.0).then(|| LOUDNESS_OFFSET + 10.0 * total_power.log10())
}

/// Measure the per-window loudness sequence for the whole source
pub fn measure_windows(source: &dyn AudioSource) -> Result<Vec<f64>> {
    let mut measurements = Vec::new();
    let mut skipped = 0_usize;

    for_each_window(source, |window| {
        let total_power: f64 = window
            .iter()
            .enumerate()
            .map(|(channel, samples)| weighted_channel_power(samples, channel))
            .sum();

        match window_loudness(total_power) {
            Some(loudness) => measurements.push(loudness),
            None => skipped += 1,
        }
    })?;

    debug!(
        windows = measurements.len() + skipped,
        silent_windows = skipped,
        "Measured window loudness"
    );

    Ok(measurements)
}
