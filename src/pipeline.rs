//! Per-hop noise suppression pipeline.
//!
//! # Lifecycle
//! - **Calibrating**: the first `calib_sec` of input only seeds the noise
//!   profile (fast, unconditional adaptation). Audio is passed through the same
//!   analysis/synthesis path with unity gain, so it stays audible and the delay
//!   does not change at the transition.
//! - **Running**: high-pass, frame, analyze, energy-gated noise update, gain,
//!   synthesize, overlap-add. Terminal; there is no way back.
//!
//! # Real-time contract
//! - One call processes exactly one hop (`frame_len / 2` samples in and out).
//! - Every buffer is sized in `new()`; `process_hop()` never allocates, locks,
//!   blocks or logs. Diagnostics leave through `Meters` and the event ring.
//! - Not reentrant; the caller serializes hops.

use crate::config::{FrameGeometry, SuppressorConfig};
use crate::dsp::utils::{frame_rms, linear_to_db};
use crate::dsp::{
    AdaptationMode, Calibrator, GainEstimator, HighPassStage, NoiseTracker, SpectralTransform,
    WindowedFramer,
};
use crate::error::{BlockLengthError, ConfigError};
use crate::events::{event_channel, EventDrain, EventSink, PipelineEvent};
use crate::meters::Meters;
use rustfft::num_complex::Complex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Calibrating,
    Running,
}

pub struct Pipeline {
    config: SuppressorConfig,
    geometry: FrameGeometry,
    state: PipelineState,

    calibrator: Calibrator,
    highpass: HighPassStage,
    framer: WindowedFramer,
    transform: SpectralTransform,
    noise: NoiseTracker,
    gain: GainEstimator,

    // Scratch
    hop_buf: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    synth_frame: Vec<f32>,

    hops_processed: u64,
    meters: Arc<Meters>,
    events: EventSink,
    event_drain: Option<EventDrain>,
}

impl Pipeline {
    pub fn new(config: SuppressorConfig) -> Result<Self, ConfigError> {
        let geometry = config.validate()?;
        let FrameGeometry {
            sample_rate,
            frame_len,
            hop_len,
            bins,
            calibration_samples,
        } = geometry;

        let framer = WindowedFramer::new(frame_len)?;
        let transform = SpectralTransform::new(frame_len);
        let highpass = HighPassStage::new(config.highpass_hz, sample_rate as f32);
        let mut noise = NoiseTracker::new(bins, config.ema_alpha, config.calib_alpha);
        let gain = GainEstimator::new(
            bins,
            config.noise_beta,
            config.noise_floor,
            config.gain_smooth,
        );

        let calibrator = Calibrator::new(calibration_samples);
        let state = if calibrator.is_complete() {
            PipelineState::Running
        } else {
            noise.reset();
            PipelineState::Calibrating
        };

        let (events, event_drain) = event_channel();
        let meters = Arc::new(Meters::new());
        meters.set_calibration_progress(calibrator.progress());

        log::info!(
            "pipeline: {} Hz, frame {} / hop {} samples, calibration {} samples, high-pass {}",
            sample_rate,
            frame_len,
            hop_len,
            calibration_samples,
            if highpass.is_enabled() {
                format!("{} Hz", config.highpass_hz)
            } else {
                "off".to_string()
            }
        );

        Ok(Self {
            config,
            geometry,
            state,
            calibrator,
            highpass,
            framer,
            transform,
            noise,
            gain,
            hop_buf: vec![0.0; hop_len],
            spectrum: vec![Complex::default(); bins],
            magnitude: vec![0.0; bins],
            synth_frame: vec![0.0; frame_len],
            hops_processed: 0,
            meters,
            events,
            event_drain: Some(event_drain),
        })
    }

    /// Processes one hop of input into one hop of output.
    ///
    /// Both slices must be exactly `hop_len` long; otherwise nothing is
    /// touched and the mismatch is returned.
    pub fn process_hop(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), BlockLengthError> {
        let hop = self.geometry.hop_len;
        for actual in [input.len(), output.len()] {
            if actual != hop {
                return Err(BlockLengthError {
                    expected: hop,
                    actual,
                });
            }
        }

        #[cfg(debug_assertions)]
        assert_no_alloc::assert_no_alloc(|| self.run_hop(input, output));
        #[cfg(not(debug_assertions))]
        self.run_hop(input, output);

        Ok(())
    }

    fn run_hop(&mut self, input: &[f32], output: &mut [f32]) {
        let mut non_finite = 0usize;
        for (dst, &x) in self.hop_buf.iter_mut().zip(input) {
            *dst = if x.is_finite() {
                x
            } else {
                non_finite += 1;
                0.0
            };
        }
        if non_finite > 0 {
            self.events.push(PipelineEvent::NonFiniteInput {
                hop: self.hops_processed,
                samples: non_finite,
            });
        }
        let input_rms = frame_rms(&self.hop_buf);

        // 1) High-pass, frame + window, forward transform
        self.highpass.process(&mut self.hop_buf);
        if !self.hop_buf.iter().all(|v| v.is_finite()) {
            // Filter state overflowed; it would never recover on its own.
            self.highpass.reset();
            self.hop_buf.fill(0.0);
            self.events.push(PipelineEvent::NumericOverflow {
                hop: self.hops_processed,
            });
        }
        let frame = self.framer.push_input(&self.hop_buf);
        self.transform.analyze(frame, &mut self.spectrum);

        let mut spectrum_finite = true;
        for (m, bin) in self.magnitude.iter_mut().zip(&self.spectrum) {
            *m = bin.norm();
            spectrum_finite &= m.is_finite();
        }

        // 2) Noise update, gain
        let mean_gain = match self.state {
            _ if !spectrum_finite => {
                // Dropped frame: an infinite bin would stay in the EMA forever.
                self.spectrum.fill(Complex::default());
                self.events.push(PipelineEvent::NumericOverflow {
                    hop: self.hops_processed,
                });
                0.0
            }
            PipelineState::Calibrating => {
                self.noise
                    .update(&self.magnitude, AdaptationMode::Calibration);
                1.0
            }
            PipelineState::Running => {
                self.noise
                    .update(&self.magnitude, AdaptationMode::EnergyGated);
                let gains = self
                    .gain
                    .compute_gain(&self.magnitude, self.noise.estimate());
                for (bin, &g) in self.spectrum.iter_mut().zip(gains) {
                    *bin *= g;
                }
                self.gain.mean_gain()
            }
        };

        // 3) Inverse transform, overlap-add
        self.transform
            .synthesize(&self.spectrum, &mut self.synth_frame);
        self.framer.push_output(&self.synth_frame, output);

        self.hops_processed += 1;

        if self.state == PipelineState::Calibrating {
            self.calibrator.record(input.len());
            if self.calibrator.is_complete() {
                self.state = PipelineState::Running;
                self.events.push(PipelineEvent::CalibrationComplete {
                    hops: self.calibrator.hops(),
                    samples: self.calibrator.elapsed_samples(),
                    noise_floor_db: self.noise_floor_db(),
                });
            }
            self.meters
                .set_calibration_progress(self.calibrator.progress());
        }

        self.meters.set_input_rms(input_rms);
        self.meters.set_output_rms(frame_rms(output));
        self.meters.set_mean_gain_db(linear_to_db(mean_gain));
        self.meters.set_noise_floor_db(self.noise_floor_db());
    }

    // Mean noise magnitude in dB, for meters and events.
    fn noise_floor_db(&self) -> f32 {
        let est = self.noise.estimate();
        let mean = est.iter().sum::<f32>() / est.len().max(1) as f32;
        linear_to_db(mean)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &SuppressorConfig {
        &self.config
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn hop_len(&self) -> usize {
        self.geometry.hop_len
    }

    /// Input-to-output delay in samples (one frame).
    pub fn latency_samples(&self) -> usize {
        self.geometry.frame_len
    }

    pub fn hops_processed(&self) -> u64 {
        self.hops_processed
    }

    pub fn calibration_progress(&self) -> f32 {
        self.calibrator.progress()
    }

    pub fn noise_estimate(&self) -> &[f32] {
        self.noise.estimate()
    }

    /// Last applied gain profile. All ones until the first running hop.
    pub fn gain_profile(&self) -> &[f32] {
        self.gain.profile()
    }

    pub fn meters(&self) -> Arc<Meters> {
        Arc::clone(&self.meters)
    }

    /// Hands out the reader half of the event ring. Only the first call
    /// returns `Some`.
    pub fn take_event_drain(&mut self) -> Option<EventDrain> {
        self.event_drain.take()
    }
}
