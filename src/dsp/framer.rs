//! Windowed framing and overlap-add resynthesis.
//!
//! The framer owns both halves of the ring state: the analysis buffer (the
//! previous hop followed by the newest hop) and the synthesis accumulator
//! (output tail still waiting for its second overlapping frame).
//!
//! Output is read from the accumulator *before* the newest frame is added,
//! so every emitted sample has received both of its contributions and the
//! stream is delayed by exactly one frame length.

use crate::dsp::utils::make_sqrt_hann_window;
use crate::error::ConfigError;

// Relative tolerance for the constant-overlap-add check.
const COLA_TOLERANCE: f32 = 1e-4;

/// Verifies that `analysis[i] * synthesis[i]` overlap-adds to a constant at
/// `hop` spacing and returns that constant.
pub fn check_perfect_reconstruction(
    analysis: &[f32],
    synthesis: &[f32],
    hop: usize,
) -> Result<f32, ConfigError> {
    let n = analysis.len();
    if n == 0 || synthesis.len() != n || hop == 0 || hop > n {
        return Err(ConfigError::WindowNotReconstructing {
            position: 0,
            sum: 0.0,
            expected: 0.0,
        });
    }

    let mut expected = None;
    for position in 0..hop {
        let mut sum = 0.0f32;
        let mut i = position;
        while i < n {
            sum += analysis[i] * synthesis[i];
            i += hop;
        }

        let reference = *expected.get_or_insert(sum);
        if reference.abs() < 1e-6 || (sum - reference).abs() > COLA_TOLERANCE * reference.abs() {
            return Err(ConfigError::WindowNotReconstructing {
                position,
                sum,
                expected: reference,
            });
        }
    }

    Ok(expected.unwrap_or(0.0))
}

pub struct WindowedFramer {
    frame_len: usize,
    hop_len: usize,
    analysis_window: Vec<f32>,
    synthesis_window: Vec<f32>,

    // [previous hop | newest hop], raw samples
    input_buf: Vec<f32>,
    // windowed copy handed to the analyzer
    frame: Vec<f32>,
    // synthesis accumulator, index 0 is the next sample to emit
    overlap: Vec<f32>,
}

impl WindowedFramer {
    /// Builds a sqrt-Hann / sqrt-Hann framer with 50 % overlap.
    pub fn new(frame_len: usize) -> Result<Self, ConfigError> {
        if frame_len % 2 != 0 {
            return Err(ConfigError::OddFrameLength(frame_len));
        }
        if frame_len < 2 {
            return Err(ConfigError::FrameTooShort { frame_len, min: 2 });
        }
        let hop_len = frame_len / 2;
        let analysis_window = make_sqrt_hann_window(frame_len);
        let mut synthesis_window = make_sqrt_hann_window(frame_len);

        let cola = check_perfect_reconstruction(&analysis_window, &synthesis_window, hop_len)?;
        if (cola - 1.0).abs() > f32::EPSILON {
            for w in &mut synthesis_window {
                *w /= cola;
            }
        }

        Ok(Self {
            frame_len,
            hop_len,
            analysis_window,
            synthesis_window,
            input_buf: vec![0.0; frame_len],
            frame: vec![0.0; frame_len],
            overlap: vec![0.0; frame_len],
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn hop_len(&self) -> usize {
        self.hop_len
    }

    /// Appends one hop and returns the windowed analysis frame.
    ///
    /// `block` must be exactly one hop long; the pipeline checks this before
    /// any state is touched.
    pub fn push_input(&mut self, block: &[f32]) -> &[f32] {
        debug_assert_eq!(block.len(), self.hop_len, "input block is not one hop");

        let n = self.frame_len;
        self.input_buf.copy_within(self.hop_len..n, 0);
        self.input_buf[n - self.hop_len..].copy_from_slice(block);

        for i in 0..n {
            self.frame[i] = self.input_buf[i] * self.analysis_window[i];
        }
        &self.frame
    }

    /// Emits the oldest hop of the accumulator into `out`, then overlap-adds
    /// `frame` (after synthesis windowing) at the new accumulator origin.
    pub fn push_output(&mut self, frame: &[f32], out: &mut [f32]) {
        debug_assert_eq!(frame.len(), self.frame_len, "synthesis frame length");
        debug_assert_eq!(out.len(), self.hop_len, "output block is not one hop");

        let n = self.frame_len;
        out.copy_from_slice(&self.overlap[..self.hop_len]);

        self.overlap.copy_within(self.hop_len..n, 0);
        for v in &mut self.overlap[n - self.hop_len..] {
            *v = 0.0;
        }

        for i in 0..n {
            self.overlap[i] += frame[i] * self.synthesis_window[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_odd_frame() {
        assert!(matches!(
            WindowedFramer::new(321),
            Err(ConfigError::OddFrameLength(321))
        ));
    }

    #[test]
    fn test_cola_constant_is_unity_for_sqrt_hann() {
        let w = make_sqrt_hann_window(512);
        let c = check_perfect_reconstruction(&w, &w, 256).unwrap();
        assert!((c - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cola_rejects_wrong_hop() {
        let w = make_sqrt_hann_window(512);
        assert!(check_perfect_reconstruction(&w, &w, 200).is_err());
    }

    #[test]
    fn test_cola_rejects_rectangular_pair_at_unaligned_hop() {
        let a = vec![1.0; 8];
        let s = vec![1.0; 8];
        // hop 3 gives 3/3/2 overlaps
        assert!(check_perfect_reconstruction(&a, &s, 3).is_err());
        assert_eq!(check_perfect_reconstruction(&a, &s, 4).unwrap(), 2.0);
    }

    #[test]
    fn test_first_two_blocks_are_silent() {
        let mut framer = WindowedFramer::new(64).unwrap();
        let hop = framer.hop_len();
        let mut out = vec![1.0; hop];
        let block = vec![0.7; hop];

        for _ in 0..2 {
            let frame = framer.push_input(&block).to_vec();
            framer.push_output(&frame, &mut out);
            assert!(out.iter().all(|&v| v == 0.0));
        }

        let frame = framer.push_input(&block).to_vec();
        framer.push_output(&frame, &mut out);
        assert!(out.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_identity_resynthesis_delays_by_one_frame() {
        let mut framer = WindowedFramer::new(64).unwrap();
        let n = framer.frame_len();
        let hop = framer.hop_len();

        let input: Vec<f32> = (0..hop * 20)
            .map(|i| (i as f32 * 0.13).sin() + 0.25 * (i as f32 * 0.71).cos())
            .collect();
        let mut output = vec![0.0; input.len()];

        for (inp, out) in input.chunks(hop).zip(output.chunks_mut(hop)) {
            // windowed frame goes straight back out; only the synthesis window
            // is applied on the way back
            let frame = framer.push_input(inp).to_vec();
            framer.push_output(&frame, out);
        }

        for i in n..input.len() {
            assert!(
                (output[i] - input[i - n]).abs() < 1e-5,
                "sample {i}: {} vs {}",
                output[i],
                input[i - n]
            );
        }
    }
}
