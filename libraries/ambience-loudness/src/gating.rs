//! Integrated loudness with two-stage gating (ITU-R BS.1770-4)
//!
//! All averaging happens in the power domain (`10^(L/10)`), never on the
//! log values directly.

/// Windows at or below this loudness are dropped by the absolute gate
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset below the absolute-gated loudness
pub const RELATIVE_GATE_OFFSET: f64 = -10.0;

/// Ungated fallback results at or below this value are discarded
pub const UNGATED_FLOOR_LUFS: f64 = -100.0;

/// Loudness value to linear power
#[inline]
pub fn db_to_power(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Linear power to loudness value
#[inline]
pub fn power_to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Power-domain mean of a set of loudness values
fn mean_loudness<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), &value| {
            (sum + db_to_power(value), count + 1)
        });

    (count > 0).then(|| power_to_db(sum / count as f64))
}

/// Integrate per-window measurements into a single loudness value
///
/// Returns `None` when nothing survives the absolute gate and the ungated
/// mean is at or below [`UNGATED_FLOOR_LUFS`].
///
/// When the absolute gate removes every window, the ungated mean is returned
/// instead of `None` as long as it is above the floor. This keeps very quiet
/// ambient material measurable; it is not part of BS.1770.
pub fn integrate(measurements: &[f64]) -> Option<f64> {
    let absolute_gated: Vec<f64> = measurements
        .iter()
        .copied()
        .filter(|&m| m > ABSOLUTE_GATE_LUFS)
        .collect();

    if absolute_gated.is_empty() {
        return mean_loudness(measurements)
            .filter(|&ungated| ungated.is_finite() && ungated > UNGATED_FLOOR_LUFS);
    }

    let absolute_gated_lufs = mean_loudness(&absolute_gated)?;
    let relative_threshold = absolute_gated_lufs + RELATIVE_GATE_OFFSET;

    let relative_gated = absolute_gated.iter().filter(|&&m| m > relative_threshold);

    Some(mean_loudness(relative_gated).unwrap_or(absolute_gated_lufs))
}
