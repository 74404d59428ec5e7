/// Counts input samples consumed while the noise profile is being seeded.
#[derive(Debug, Clone)]
pub struct Calibrator {
    target_samples: u64,
    elapsed_samples: u64,
    hops: u64,
}

impl Calibrator {
    pub fn new(target_samples: u64) -> Self {
        Self {
            target_samples,
            elapsed_samples: 0,
            hops: 0,
        }
    }

    pub fn record(&mut self, samples: usize) {
        self.elapsed_samples = self.elapsed_samples.saturating_add(samples as u64);
        self.hops += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_samples >= self.target_samples
    }

    /// 0..1 progress through the calibration budget (useful for UI)
    pub fn progress(&self) -> f32 {
        if self.target_samples == 0 {
            return 1.0;
        }
        (self.elapsed_samples as f64 / self.target_samples as f64).clamp(0.0, 1.0) as f32
    }

    pub fn elapsed_samples(&self) -> u64 {
        self.elapsed_samples
    }

    pub fn hops(&self) -> u64 {
        self.hops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_is_complete_immediately() {
        let cal = Calibrator::new(0);
        assert!(cal.is_complete());
        assert_eq!(cal.progress(), 1.0);
    }

    #[test]
    fn test_completes_on_exact_sample_count() {
        let mut cal = Calibrator::new(16_000);
        for _ in 0..99 {
            cal.record(160);
            assert!(!cal.is_complete());
        }
        cal.record(160);
        assert!(cal.is_complete());
        assert_eq!(cal.hops(), 100);
        assert_eq!(cal.elapsed_samples(), 16_000);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut cal = Calibrator::new(100);
        cal.record(50);
        assert!((cal.progress() - 0.5).abs() < 1e-6);
        cal.record(500);
        assert_eq!(cal.progress(), 1.0);
    }
}
