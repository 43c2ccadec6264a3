//! Second-order IIR filter (Direct Form I difference equation)
//!
//! Coefficients are expected pre-normalized so that `a0 == 1`:
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! Filter state lives only for the duration of one [`apply`] call. Each
//! analysis window is filtered from a zeroed state, so stored profiles stay
//! comparable with earlier analyses.

/// Biquad filter coefficients, `b = [b0, b1, b2]`, `a = [1, a1, a2]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficients
    pub b: [f64; 3],
    /// Feedback coefficients (`a[0]` is assumed to be 1.0 and ignored)
    pub a: [f64; 3],
}

impl BiquadCoefficients {
    /// Build coefficients from the feedforward and feedback vectors
    pub const fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self { b, a }
    }

    /// Pass-through coefficients
    pub const fn identity() -> Self {
        Self {
            b: [1.0, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        }
    }
}

/// Per-channel, per-stage filter memory
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    /// Create a zeroed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single sample, advancing the filter memory
    #[inline]
    pub fn process(&mut self, input: f64, coeffs: &BiquadCoefficients) -> f64 {
        let [b0, b1, b2] = coeffs.b;
        let [_, a1, a2] = coeffs.a;

        let output = b0 * input + b1 * self.x1 + b2 * self.x2 - a1 * self.y1 - a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Filter one contiguous window of samples, starting from a zeroed state
///
/// The output has the same length as the input.
pub fn apply(samples: &[f64], coeffs: &BiquadCoefficients) -> Vec<f64> {
    let mut state = BiquadState::new();
    samples
        .iter()
        .map(|&sample| state.process(sample, coeffs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let input = vec![0.5, -0.25, 1.0, 0.0, -1.0];
        let output = apply(&input, &BiquadCoefficients::identity());
        assert_eq!(input, output);
    }

    #[test]
    fn test_output_length_matches_input() {
        let coeffs = BiquadCoefficients::new([0.5, 0.25, 0.125], [1.0, -0.5, 0.1]);
        assert_eq!(apply(&[0.0; 37], &coeffs).len(), 37);
        assert!(apply(&[], &coeffs).is_empty());
    }

    #[test]
    fn test_impulse_response_follows_difference_equation() {
        let coeffs = BiquadCoefficients::new([1.0, 2.0, 3.0], [1.0, 0.5, 0.25]);
        let output = apply(&[1.0, 0.0, 0.0, 0.0], &coeffs);

        // y0 = 1
        // y1 = 2 - 0.5*1 = 1.5
        // y2 = 3 - 0.5*1.5 - 0.25*1 = 2.0
        // y3 = 0 - 0.5*2.0 - 0.25*1.5 = -1.375
        let expected = [1.0, 1.5, 2.0, -1.375];
        for (got, want) in output.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_state_does_not_carry_between_calls() {
        let coeffs = BiquadCoefficients::new([1.0, 1.0, 0.0], [1.0, -0.9, 0.0]);
        let first = apply(&[1.0, 1.0, 1.0], &coeffs);
        let second = apply(&[1.0, 1.0, 1.0], &coeffs);
        assert_eq!(first, second);
    }
}
