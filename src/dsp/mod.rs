pub mod biquad;
pub mod calibrator;
pub mod framer;
pub mod gain;
pub mod highpass;
pub mod noise_tracker;
pub mod spectral;
pub mod utils;

pub use biquad::Biquad;
pub use calibrator::Calibrator;
pub use framer::{check_perfect_reconstruction, WindowedFramer};
pub use gain::GainEstimator;
pub use highpass::HighPassStage;
pub use noise_tracker::{adaptation_rate, mean_power, AdaptationMode, NoiseTracker};
pub use spectral::SpectralTransform;
