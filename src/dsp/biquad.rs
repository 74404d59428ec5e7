//! Biquad Filter Implementation (IIR 2nd Order)
//!
//! Only the high-pass design is needed by the capture chain. The recursion is
//! transposed direct form II with a tiny DC offset on the delay line so the
//! state never decays into denormals during long stretches of silence.

use std::f32::consts::{FRAC_1_SQRT_2, PI};

/// Q of a second-order Butterworth section.
pub const BUTTERWORTH_Q: f32 = FRAC_1_SQRT_2;

/// Biquad filter implementation (IIR 2nd order)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,
    z1: f32,
    z2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    /// Identity filter with cleared state.
    pub fn new() -> Self {
        Self {
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// RBJ high-pass section.
    pub fn highpass(cutoff: f32, q: f32, sr: f32) -> Self {
        let mut filter = Self::new();
        filter.update_hpf(cutoff, q, sr);
        filter
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let out = input * self.a0 + self.z1;

        // Anti-denormal: tiny DC offset
        self.z1 = input * self.a1 + self.z2 - self.b1 * out + 1e-25;
        self.z2 = input * self.a2 - self.b2 * out + 1e-25;

        out
    }

    /// Clears the delay line. Coefficients are kept.
    #[inline]
    pub fn reset_state(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    pub fn update_hpf(&mut self, cutoff: f32, q: f32, sr: f32) {
        let w0 = 2.0 * PI * cutoff / sr;
        let alpha = w0.sin() / (2.0 * q.max(1e-6));
        let cw0 = w0.cos();

        let inv_a0 = 1.0 / (1.0 + alpha);

        self.a0 = ((1.0 + cw0) * 0.5) * inv_a0;
        self.a1 = -(1.0 + cw0) * inv_a0;
        self.a2 = ((1.0 + cw0) * 0.5) * inv_a0;
        self.b1 = (-2.0 * cw0) * inv_a0;
        self.b2 = (1.0 - alpha) * inv_a0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_samples() {
        let mut f = Biquad::new();
        for i in 0..32 {
            let x = i as f32 * 0.1;
            assert!((f.process(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut f = Biquad::highpass(80.0, BUTTERWORTH_Q, 16_000.0);
        let mut last = 1.0;
        for _ in 0..16_000 {
            last = f.process(1.0);
        }
        assert!(last.abs() < 1e-3, "dc leaked: {last}");
    }

    #[test]
    fn test_reset_state_clears_memory() {
        let mut f = Biquad::highpass(80.0, BUTTERWORTH_Q, 16_000.0);
        for _ in 0..100 {
            f.process(1.0);
        }
        f.reset_state();
        let mut fresh = Biquad::highpass(80.0, BUTTERWORTH_Q, 16_000.0);
        assert!((f.process(0.5) - fresh.process(0.5)).abs() < 1e-6);
    }
}
