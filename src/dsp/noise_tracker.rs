//! Per-bin running estimate of the stationary noise magnitude.
//!
//! The estimate moves only through one EMA rule,
//! `noise[i] = a * noise[i] + (1 - a) * mag[i]`, with the coefficient `a`
//! chosen once per frame:
//! - calibration: a fixed fast coefficient, unconditionally
//! - running: `adaptation_rate()` of the frame power relative to the power of
//!   the current estimate, so frames that carry speech barely move it
//!
//! The estimate is only re-seeded through `reset()`, which the pipeline calls
//! when calibration starts.

use crate::dsp::utils::{lerp, smoothstep};

/// Seed magnitude for every bin before any frame has been seen.
pub const NOISE_INIT: f32 = 1e-3;

// Frame-to-noise power ratios bracketing the speech decision (~3 dB .. ~6 dB).
const SPEECH_RATIO_LOW: f32 = 2.0;
const SPEECH_RATIO_HIGH: f32 = 4.0;
// Fraction of the normal adaptation speed kept while speech is present.
const SPEECH_ADAPT_SCALE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationMode {
    /// Forced fast adaptation, no energy judgment.
    Calibration,
    /// Coefficient from `adaptation_rate()`.
    EnergyGated,
}

/// Mean squared magnitude over all bins.
pub fn mean_power(profile: &[f32]) -> f32 {
    if profile.is_empty() {
        return 0.0;
    }
    let mut acc = 0.0f32;
    for &m in profile {
        acc += m * m;
    }
    acc / profile.len() as f32
}

/// EMA coefficient for one frame.
///
/// Returns `alpha` for frames whose power is close to the tracked noise power,
/// and a slower coefficient (closer to 1.0) as the frame power rises above it.
pub fn adaptation_rate(frame_power: f32, noise_power: f32, alpha: f32) -> f32 {
    if !(noise_power.is_finite() && noise_power > 0.0) || !frame_power.is_finite() {
        return alpha;
    }
    let slow = 1.0 - (1.0 - alpha) * SPEECH_ADAPT_SCALE;
    let ratio = frame_power / noise_power;
    lerp(
        alpha,
        slow,
        smoothstep(SPEECH_RATIO_LOW, SPEECH_RATIO_HIGH, ratio),
    )
}

pub struct NoiseTracker {
    estimate: Vec<f32>,
    alpha: f32,
    calibration_alpha: f32,
}

impl NoiseTracker {
    pub fn new(bins: usize, alpha: f32, calibration_alpha: f32) -> Self {
        Self {
            estimate: vec![NOISE_INIT; bins],
            alpha,
            calibration_alpha,
        }
    }

    /// Folds the current frame magnitude into the estimate and returns the
    /// coefficient that was used.
    pub fn update(&mut self, magnitude: &[f32], mode: AdaptationMode) -> f32 {
        debug_assert_eq!(magnitude.len(), self.estimate.len());

        let a = match mode {
            AdaptationMode::Calibration => self.calibration_alpha,
            AdaptationMode::EnergyGated => adaptation_rate(
                mean_power(magnitude),
                mean_power(&self.estimate),
                self.alpha,
            ),
        };

        for (n, &m) in self.estimate.iter_mut().zip(magnitude) {
            *n = a * *n + (1.0 - a) * m;
        }
        a
    }

    pub fn estimate(&self) -> &[f32] {
        &self.estimate
    }

    pub fn reset(&mut self) {
        self.estimate.fill(NOISE_INIT);
    }
}
