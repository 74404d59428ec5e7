//! Thread-safe metering for the capture pipeline.
//!
//! The audio thread writes once per hop; any other thread may read at any
//! time. Values are f32 bit patterns in `AtomicU32`, so neither side locks.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct Meters {
    input_rms: AtomicU32,
    output_rms: AtomicU32,
    mean_gain_db: AtomicU32,
    noise_floor_db: AtomicU32,
    calibration_progress: AtomicU32,
}

impl Meters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input_rms(&self, val: f32) {
        self.input_rms.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_output_rms(&self, val: f32) {
        self.output_rms.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_mean_gain_db(&self, val: f32) {
        self.mean_gain_db.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_noise_floor_db(&self, val: f32) {
        self.noise_floor_db.store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn set_calibration_progress(&self, val: f32) {
        self.calibration_progress
            .store(val.to_bits(), Ordering::Relaxed);
    }

    pub fn get_input_rms(&self) -> f32 {
        f32::from_bits(self.input_rms.load(Ordering::Relaxed))
    }

    pub fn get_output_rms(&self) -> f32 {
        f32::from_bits(self.output_rms.load(Ordering::Relaxed))
    }

    pub fn get_mean_gain_db(&self) -> f32 {
        f32::from_bits(self.mean_gain_db.load(Ordering::Relaxed))
    }

    pub fn get_noise_floor_db(&self) -> f32 {
        f32::from_bits(self.noise_floor_db.load(Ordering::Relaxed))
    }

    pub fn get_calibration_progress(&self) -> f32 {
        f32::from_bits(self.calibration_progress.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_values_visible_across_threads() {
        let meters = Arc::new(Meters::new());
        let writer = Arc::clone(&meters);
        std::thread::spawn(move || {
            writer.set_output_rms(0.125);
            writer.set_mean_gain_db(-6.0);
        })
        .join()
        .unwrap();
        assert_eq!(meters.get_output_rms(), 0.125);
        assert_eq!(meters.get_mean_gain_db(), -6.0);
        assert_eq!(meters.get_input_rms(), 0.0);
    }
}
