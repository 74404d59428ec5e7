use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration, reported before any audio is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("frame length {0} samples is odd; 50% overlap needs an even frame")]
    OddFrameLength(usize),

    #[error("frame length {frame_len} samples is below the minimum of {min}")]
    FrameTooShort { frame_len: usize, min: usize },

    #[error("high-pass cutoff {cutoff_hz} Hz must be in [0, {nyquist_hz}) Hz")]
    CutoffOutOfRange { cutoff_hz: f32, nyquist_hz: f32 },

    #[error("{name} = {value} is outside {range}")]
    ParameterOutOfRange {
        name: &'static str,
        value: f32,
        range: &'static str,
    },

    #[error("window pair does not overlap-add to a constant (position {position}: {sum} vs {expected})")]
    WindowNotReconstructing {
        position: usize,
        sum: f32,
        expected: f32,
    },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A hop-sized slice had the wrong length. No state was modified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected a block of {expected} samples, got {actual}")]
pub struct BlockLengthError {
    pub expected: usize,
    pub actual: usize,
}
