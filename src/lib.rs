//! Hushmic: real-time spectral-subtraction noise suppressor for a mono
//! microphone stream.
//!
//! Signal flow per hop (half a frame):
//!
//! ```text
//! input -> high-pass -> frame + sqrt-Hann -> FFT -> |X|
//!       -> noise EMA (calibration / energy gated) -> gain
//!       -> X * gain -> IFFT -> sqrt-Hann -> overlap-add -> output
//! ```
//!
//! `Pipeline` consumes exactly one hop per call. `StreamAdapter` accepts
//! callbacks of any size on top of it.

pub mod config;
pub mod dsp;
pub mod error;
pub mod events;
pub mod meters;
pub mod pipeline;
pub mod stream;

pub use config::{ConfigOverrides, FrameGeometry, SuppressorConfig};
pub use error::{BlockLengthError, ConfigError};
pub use events::{EventDrain, PipelineEvent};
pub use meters::Meters;
pub use pipeline::{Pipeline, PipelineState};
pub use stream::StreamAdapter;

// Turns any allocation inside `assert_no_alloc` into a hard failure.
#[cfg(all(test, debug_assertions))]
#[global_allocator]
static ALLOC: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;
