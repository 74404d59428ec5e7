//! Spectral-subtraction gain with temporal smoothing.
//!
//! Per bin:
//!   clean = max(signal - beta * noise, floor * noise)
//!   raw   = clean / max(signal, eps)
//!   gain  = clamp(smooth * prev + (1 - smooth) * raw, floor, 1)
//!
//! The smoothed profile is the only state and is overwritten on every call.

use crate::dsp::utils::GAIN_EPS;

pub struct GainEstimator {
    beta: f32,
    floor: f32,
    smoothing: f32,
    // Per-bin smoothed gains (nyq+1)
    previous: Vec<f32>,
    primed: bool,
}

impl GainEstimator {
    pub fn new(bins: usize, beta: f32, floor: f32, smoothing: f32) -> Self {
        Self {
            beta,
            floor,
            smoothing,
            previous: vec![1.0; bins],
            primed: false,
        }
    }

    /// Computes the smoothed gain profile for one frame and returns it.
    ///
    /// The very first frame has no history, so its raw gain seeds the profile
    /// directly.
    pub fn compute_gain(&mut self, signal: &[f32], noise: &[f32]) -> &[f32] {
        debug_assert_eq!(signal.len(), self.previous.len());
        debug_assert_eq!(noise.len(), self.previous.len());

        let keep = if self.primed { self.smoothing } else { 0.0 };

        for ((g, &s), &n) in self.previous.iter_mut().zip(signal).zip(noise) {
            let clean = (s - self.beta * n).max(self.floor * n);
            let raw = clean / s.max(GAIN_EPS);
            let smoothed = keep * *g + (1.0 - keep) * raw;
            *g = smoothed.clamp(self.floor, 1.0);
        }

        self.primed = true;
        &self.previous
    }

    pub fn profile(&self) -> &[f32] {
        &self.previous
    }

    /// Mean gain over all bins of the current profile.
    pub fn mean_gain(&self) -> f32 {
        if self.previous.is_empty() {
            return 1.0;
        }
        self.previous.iter().sum::<f32>() / self.previous.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_first_frame_is_unsmoothed() {
        let mut est = GainEstimator::new(3, 1.0, 0.02, 0.8);
        let g = est.compute_gain(&[1.0, 2.0, 4.0], &[0.5, 0.5, 0.5]);
        assert!((g[0] - 0.5).abs() < 1e-6);
        assert!((g[1] - 0.75).abs() < 1e-6);
        assert!((g[2] - 0.875).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_blends_with_previous() {
        let mut est = GainEstimator::new(1, 1.0, 0.02, 0.8);
        est.compute_gain(&[1.0], &[0.0]); // raw gain 1.0
        let g = est.compute_gain(&[1.0], &[0.5])[0]; // raw gain 0.5
        assert!((g - (0.8 * 1.0 + 0.2 * 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_floor_applies_when_noise_dominates() {
        let mut est = GainEstimator::new(1, 2.0, 0.1, 0.0);
        let g = est.compute_gain(&[1.0], &[1.0])[0];
        // clean = max(1 - 2, 0.1 * 1) = 0.1
        assert!((g - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_signal_is_guarded() {
        let mut est = GainEstimator::new(2, 1.0, 0.02, 0.8);
        let g = est.compute_gain(&[0.0, 0.0], &[0.0, 1e-3]);
        assert!(g.iter().all(|v| v.is_finite()));
        assert!(g.iter().all(|&v| (0.02..=1.0).contains(&v)));
    }

    #[test]
    fn test_unity_floor_forces_unity_gain() {
        let mut est = GainEstimator::new(4, 3.0, 1.0, 0.5);
        for _ in 0..5 {
            let g = est.compute_gain(&[0.1, 1.0, 0.0, 5.0], &[1.0, 1.0, 1.0, 0.2]);
            assert!(g.iter().all(|&v| v == 1.0));
        }
    }

    #[test]
    fn test_gain_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let floor = 0.05;
        let mut est = GainEstimator::new(65, 1.5, floor, 0.7);
        let mut signal = vec![0.0f32; 65];
        let mut noise = vec![0.0f32; 65];
        for _ in 0..500 {
            for (s, n) in signal.iter_mut().zip(noise.iter_mut()) {
                *s = rng.gen_range(0.0..2.0);
                *n = rng.gen_range(0.0..1.0);
            }
            for &g in est.compute_gain(&signal, &noise) {
                assert!(g >= floor && g <= 1.0, "{g}");
            }
        }
    }
}
