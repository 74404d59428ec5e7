//! Forward / inverse transform wrapping.
//!
//! A full-length complex FFT is run on the real frame and only the
//! non-negative bins (`N/2 + 1`) are exposed. On the way back the negative
//! half is rebuilt by conjugate symmetry, DC and Nyquist are forced real, and
//! the imaginary round-off of the inverse is discarded.
//!
//! Plans and scratch space are created once; `analyze`/`synthesize` never
//! allocate.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    frame_len: usize,

    // Scratch
    work: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    ifft_scratch: Vec<Complex<f32>>,
}

impl SpectralTransform {
    pub fn new(frame_len: usize) -> Self {
        assert!(frame_len >= 2 && frame_len % 2 == 0, "frame_len must be even");

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_len);
        let ifft = planner.plan_fft_inverse(frame_len);

        let fft_scratch_len = fft.get_inplace_scratch_len();
        let ifft_scratch_len = ifft.get_inplace_scratch_len();

        Self {
            fft,
            ifft,
            frame_len,
            work: vec![Complex::default(); frame_len],
            fft_scratch: vec![Complex::default(); fft_scratch_len],
            ifft_scratch: vec![Complex::default(); ifft_scratch_len],
        }
    }

    /// Number of non-negative frequency bins, `N/2 + 1`.
    pub fn bins(&self) -> usize {
        self.frame_len / 2 + 1
    }

    /// Real frame of `N` samples into `N/2 + 1` complex bins.
    pub fn analyze(&mut self, frame: &[f32], spectrum: &mut [Complex<f32>]) {
        let n = self.frame_len;
        debug_assert_eq!(frame.len(), n);
        debug_assert_eq!(spectrum.len(), self.bins());

        for (w, &x) in self.work.iter_mut().zip(frame) {
            *w = Complex::new(x, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.work, &mut self.fft_scratch);

        spectrum.copy_from_slice(&self.work[..=n / 2]);
    }

    /// `N/2 + 1` complex bins back to a real frame of `N` samples.
    pub fn synthesize(&mut self, spectrum: &[Complex<f32>], frame: &mut [f32]) {
        let n = self.frame_len;
        let nyq = n / 2;
        debug_assert_eq!(spectrum.len(), self.bins());
        debug_assert_eq!(frame.len(), n);

        self.work[..=nyq].copy_from_slice(spectrum);
        self.work[0].im = 0.0;
        self.work[nyq].im = 0.0;
        for k in 1..nyq {
            self.work[n - k] = self.work[k].conj();
        }

        self.ifft
            .process_with_scratch(&mut self.work, &mut self.ifft_scratch);

        let norm = 1.0 / n as f32;
        for (y, w) in frame.iter_mut().zip(&self.work) {
            *y = w.re * norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_bin_count() {
        assert_eq!(SpectralTransform::new(320).bins(), 161);
    }

    #[test]
    fn test_round_trip_random_frames() {
        let mut rng = StdRng::seed_from_u64(7);
        for &n in &[64usize, 320, 960] {
            let mut t = SpectralTransform::new(n);
            let mut spectrum = vec![Complex::default(); t.bins()];
            let mut back = vec![0.0f32; n];

            for _ in 0..8 {
                let frame: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
                t.analyze(&frame, &mut spectrum);
                t.synthesize(&spectrum, &mut back);

                let peak = frame.iter().fold(0.0f32, |m, v| m.max(v.abs()));
                for (a, b) in frame.iter().zip(&back) {
                    assert!((a - b).abs() <= 1e-6 * peak, "n={n}: {a} vs {b}");
                }
            }
        }
    }

    #[test]
    fn test_dc_lands_in_bin_zero() {
        let mut t = SpectralTransform::new(64);
        let mut spectrum = vec![Complex::default(); t.bins()];
        t.analyze(&[0.5; 64], &mut spectrum);
        assert!((spectrum[0].re - 32.0).abs() < 1e-4);
        for bin in &spectrum[1..] {
            assert!(bin.norm() < 1e-4);
        }
    }

    #[test]
    fn test_synthesize_ignores_imaginary_dc_and_nyquist() {
        let mut t = SpectralTransform::new(16);
        let mut spectrum = vec![Complex::default(); t.bins()];
        spectrum[0] = Complex::new(16.0, 3.0);
        spectrum[8] = Complex::new(0.0, -2.0);
        let mut out = vec![0.0f32; 16];
        t.synthesize(&spectrum, &mut out);
        for v in out {
            assert!((v - 1.0).abs() < 1e-5);
        }
    }
}
