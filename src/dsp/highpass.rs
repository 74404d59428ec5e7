use crate::dsp::biquad::{Biquad, BUTTERWORTH_Q};

/// Capture high-pass stage.
///
/// Removes rumble below the configured cutoff before the block reaches the
/// framer, so subsonic energy never lands in the learned noise profile.
/// A cutoff of zero builds no filter at all and the stage is a pass-through.
pub struct HighPassStage {
    filter: Option<Biquad>,
}

impl HighPassStage {
    /// Coefficients are derived here once; the caller has already checked
    /// `cutoff_hz < sample_rate / 2`.
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let filter = if cutoff_hz > 0.0 {
            Some(Biquad::highpass(cutoff_hz, BUTTERWORTH_Q, sample_rate))
        } else {
            None
        };
        Self { filter }
    }

    pub fn is_enabled(&self) -> bool {
        self.filter.is_some()
    }

    /// Filters `block` in place. State carries over to the next call.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        if let Some(filter) = self.filter.as_mut() {
            for s in block.iter_mut() {
                *s = filter.process(*s);
            }
        }
    }

    pub fn reset(&mut self) {
        if let Some(filter) = self.filter.as_mut() {
            filter.reset_state();
        }
    }
}
