//! Suppressor configuration.
//!
//! Defaults match a 16 kHz voice capture with 20 ms frames. A JSON file can
//! override any subset of the fields; command-line style overrides are merged
//! on top of that through `ConfigOverrides`. The config is validated once,
//! before a pipeline is built, and never changes afterwards.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Smallest frame the framer and transform are exercised with.
pub const MIN_FRAME_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuppressorConfig {
    /// Hz
    pub samplerate: u32,
    /// Frame duration in ms; the hop is half of it.
    pub frame_ms: u32,
    /// Seconds of input used to seed the noise profile.
    pub calib_sec: f32,
    /// High-pass cutoff in Hz, 0 disables the stage.
    pub highpass_hz: f32,
    /// Subtraction aggressiveness (beta).
    pub noise_beta: f32,
    /// Residual floor multiplier, also the lower gain bound.
    pub noise_floor: f32,
    /// Noise EMA coefficient while running.
    pub ema_alpha: f32,
    /// Noise EMA coefficient while calibrating.
    pub calib_alpha: f32,
    /// Temporal gain smoothing coefficient (gamma).
    pub gain_smooth: f32,
    /// Opaque device selectors for the audio host; not interpreted here.
    pub device_in: String,
    pub device_out: String,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            samplerate: 16_000,
            frame_ms: 20,
            calib_sec: 1.0,
            highpass_hz: 80.0,
            noise_beta: 1.0,
            noise_floor: 0.02,
            ema_alpha: 0.96,
            calib_alpha: 0.9,
            gain_smooth: 0.8,
            device_in: "default".to_string(),
            device_out: "default".to_string(),
        }
    }
}

/// Sizes derived from a validated config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub sample_rate: u32,
    pub frame_len: usize,
    pub hop_len: usize,
    /// `frame_len / 2 + 1`
    pub bins: usize,
    pub calibration_samples: u64,
}

impl SuppressorConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        overrides.apply(&mut self);
        self
    }

    /// Frame length in samples, before any validation.
    pub fn frame_len(&self) -> usize {
        (self.samplerate as u64 * self.frame_ms as u64 / 1000) as usize
    }

    pub fn validate(&self) -> Result<FrameGeometry, ConfigError> {
        if self.samplerate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }

        let frame_len = self.frame_len();
        if frame_len % 2 != 0 {
            return Err(ConfigError::OddFrameLength(frame_len));
        }
        if frame_len < MIN_FRAME_LEN {
            return Err(ConfigError::FrameTooShort {
                frame_len,
                min: MIN_FRAME_LEN,
            });
        }

        let nyquist_hz = self.samplerate as f32 * 0.5;
        if !(self.highpass_hz.is_finite() && self.highpass_hz >= 0.0 && self.highpass_hz < nyquist_hz)
        {
            return Err(ConfigError::CutoffOutOfRange {
                cutoff_hz: self.highpass_hz,
                nyquist_hz,
            });
        }

        check_range("noise_beta", self.noise_beta, 0.0, f32::MAX, "[0, inf)")?;
        check_range("noise_floor", self.noise_floor, 0.0, 1.0, "[0, 1]")?;
        check_unit_open("ema_alpha", self.ema_alpha)?;
        check_unit_open("calib_alpha", self.calib_alpha)?;
        check_unit_open("gain_smooth", self.gain_smooth)?;
        check_range("calib_sec", self.calib_sec, 0.0, f32::MAX, "[0, inf)")?;

        let calibration_samples =
            (self.calib_sec as f64 * self.samplerate as f64).round() as u64;

        Ok(FrameGeometry {
            sample_rate: self.samplerate,
            frame_len,
            hop_len: frame_len / 2,
            bins: frame_len / 2 + 1,
            calibration_samples,
        })
    }
}

fn check_range(
    name: &'static str,
    value: f32,
    min: f32,
    max: f32,
    range: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::ParameterOutOfRange { name, value, range })
    }
}

fn check_unit_open(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ParameterOutOfRange {
            name,
            value,
            range: "[0, 1)",
        })
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub samplerate: Option<u32>,
    pub frame_ms: Option<u32>,
    pub calib_sec: Option<f32>,
    pub highpass_hz: Option<f32>,
    pub noise_beta: Option<f32>,
    pub noise_floor: Option<f32>,
    pub ema_alpha: Option<f32>,
    pub calib_alpha: Option<f32>,
    pub gain_smooth: Option<f32>,
    pub device_in: Option<String>,
    pub device_out: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut SuppressorConfig) {
        if let Some(v) = self.samplerate {
            cfg.samplerate = v;
        }
        if let Some(v) = self.frame_ms {
            cfg.frame_ms = v;
        }
        if let Some(v) = self.calib_sec {
            cfg.calib_sec = v;
        }
        if let Some(v) = self.highpass_hz {
            cfg.highpass_hz = v;
        }
        if let Some(v) = self.noise_beta {
            cfg.noise_beta = v;
        }
        if let Some(v) = self.noise_floor {
            cfg.noise_floor = v;
        }
        if let Some(v) = self.ema_alpha {
            cfg.ema_alpha = v;
        }
        if let Some(v) = self.calib_alpha {
            cfg.calib_alpha = v;
        }
        if let Some(v) = self.gain_smooth {
            cfg.gain_smooth = v;
        }
        if let Some(v) = &self.device_in {
            cfg.device_in = v.clone();
        }
        if let Some(v) = &self.device_out {
            cfg.device_out = v.clone();
        }
    }
}
