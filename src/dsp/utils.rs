use std::f32::consts::PI;

/// Lower bound applied to magnitudes before they are used as divisors or in logs.
pub const MAG_FLOOR: f32 = 1e-12;

/// Guard for the gain division when a bin carries (almost) no energy.
pub const GAIN_EPS: f32 = 1e-8;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let denom = (edge1 - edge0).max(1e-12);
    let t = ((x - edge0) / denom).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn linear_to_db(gain: f32) -> f32 {
    20.0 * gain.max(MAG_FLOOR).log10()
}

pub fn frame_rms(x: &[f32]) -> f32 {
    let mut s = 0.0f32;
    for &v in x {
        s += v * v;
    }
    (s / (x.len().max(1) as f32)).sqrt()
}

/// Periodic square-root Hann window.
///
/// The periodic form (denominator `n`, not `n - 1`) is what makes
/// `w[i]^2 + w[i + n/2]^2 == 1` hold exactly, so using it for both analysis
/// and synthesis reconstructs perfectly at 50 % overlap.
pub fn make_sqrt_hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let hann = 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos();
            hann.max(0.0).sqrt()
        })
        .collect()
}
