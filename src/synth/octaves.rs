//! Octave composition: time-blended noise frames with geometric falloff.

use std::f32::consts::PI;

use crate::params::SynthParams;
use crate::synth::lattice::NoiseLattice;

/// Hard cap on active octaves; parameter values beyond this are clamped
pub const MAX_OCTAVES: usize = 16;

/// Low-pass coefficient for per-call frame-delta smoothing
const DT_SMOOTHING: f32 = 0.2;

const MIN_FALLOFF: f32 = 1.0e-3;
const MIN_TIME_MULTIPLIER: f32 = 1.0e-3;

/// One composited noise octave: a toroidal grid blended from three
/// adjacent lattice frames, pre-scaled by the octave's weight.
pub struct OctaveImage {
    data: Vec<f32>,
    size: usize,
    mask: usize,
}

impl OctaveImage {
    fn zeroed(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
            mask: size - 1,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Toroidal integer lookup (negative coordinates wrap).
    #[inline]
    pub fn get(&self, u: i64, v: i64) -> f32 {
        let u = (u & self.mask as i64) as usize;
        let v = (v & self.mask as i64) as usize;
        self.data[v * self.size + u]
    }

    /// Bilinear lookup at fractional toroidal texel coordinates.
    pub fn sample_linear(&self, u: f32, v: f32) -> f32 {
        let fu = u.floor();
        let fv = v.floor();
        let du = u - fu;
        let dv = v - fv;
        let u0 = fu as i64;
        let v0 = fv as i64;

        let top = self.get(u0, v0) * (1.0 - du) + self.get(u0 + 1, v0) * du;
        let bottom = self.get(u0, v0 + 1) * (1.0 - du) + self.get(u0 + 1, v0 + 1) * du;
        top * (1.0 - dv) + bottom * dv
    }

    /// Bilinear lookup at integer coordinates of a grid `2^factor_log2`
    /// times finer than this octave. Lets one small octave buffer supply
    /// detail at several effective resolutions without storing them.
    pub fn sample_upsampled(&self, x: i64, y: i64, factor_log2: u32) -> f32 {
        if factor_log2 == 0 {
            return self.get(x, y);
        }
        let factor = 1i64 << factor_log2;
        let u0 = x >> factor_log2;
        let v0 = y >> factor_log2;
        let du = (x & (factor - 1)) as f32 / factor as f32;
        let dv = (y & (factor - 1)) as f32 / factor as f32;

        let top = self.get(u0, v0) * (1.0 - du) + self.get(u0 + 1, v0) * du;
        let bottom = self.get(u0, v0 + 1) * (1.0 - du) + self.get(u0 + 1, v0 + 1) * du;
        top * (1.0 - dv) + bottom * dv
    }
}

/// Noise-time accumulator with low-pass smoothing of frame deltas.
///
/// Smoothing the raw delta before accumulating avoids popping when frame
/// time is irregular; pausing freezes accumulation but keeps the filter
/// state tracking so resume is smooth.
pub struct NoiseClock {
    time: f64,
    smoothed_dt: f32,
}

impl NoiseClock {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            smoothed_dt: 0.0,
        }
    }

    pub fn advance(&mut self, raw_dt: f32, animation_speed: f32, paused: bool) {
        self.smoothed_dt += (raw_dt - self.smoothed_dt) * DT_SMOOTHING;
        if !paused {
            self.time += (self.smoothed_dt * animation_speed) as f64;
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

impl Default for NoiseClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Blend weights for three cyclic frames at fractional frame time `frac`.
///
/// Squared sines spaced 120 degrees apart: the sum is time-invariant, the
/// blend is periodic, and the weight of the outgoing frame reaches zero
/// exactly at the frame boundary, so there is no popping.
fn crossfade_weights(frac: f32) -> [f32; 3] {
    let base = PI * (1.0 - frac) / 3.0;
    let w0 = base.sin().powi(2);
    let w1 = (base + PI / 3.0).sin().powi(2);
    let w2 = (base + 2.0 * PI / 3.0).sin().powi(2);
    // w0 + w1 + w2 == 3/2 for any frac; normalize to 1
    [w0 / 1.5, w1 / 1.5, w2 / 1.5]
}

/// Per-octave normalized weights: geometric falloff summing to 1.
pub fn octave_weights(falloff: f32, octaves: usize) -> Vec<f32> {
    let falloff = falloff.max(MIN_FALLOFF);
    let mut weights = Vec::with_capacity(octaves);
    let mut w = 1.0f32;
    let mut total = 0.0f32;
    for _ in 0..octaves {
        weights.push(w);
        total += w;
        w *= falloff;
    }
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// The full set of composited octaves for the current animation time.
///
/// Ephemeral derived state: every image is fully recomputed on each
/// `compose` call; nothing persists across frames but the allocations.
pub struct OctaveStack {
    images: Vec<OctaveImage>,
    size: usize,
}

impl OctaveStack {
    pub fn new(size: usize) -> Self {
        Self {
            images: Vec::new(),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, index: usize) -> &OctaveImage {
        &self.images[index]
    }

    pub fn images(&self) -> &[OctaveImage] {
        &self.images
    }

    /// Recompute every octave image for the given noise time.
    ///
    /// Each octave advances through the lattice frame ring at its own rate
    /// (a running multiplier; lower-index octaves move faster), blends the
    /// three adjacent cyclic frames with the crossfade, and pre-scales the
    /// result by its normalized falloff weight.
    pub fn compose(&mut self, lattice: &NoiseLattice, time: f64, params: &SynthParams) {
        let octaves = params.octaves.clamp(1, MAX_OCTAVES);
        let weights = octave_weights(params.falloff, octaves);
        let time_multiplier = params.time_multiplier.max(MIN_TIME_MULTIPLIER) as f64;

        self.ensure_layout(octaves);

        let size = self.size;
        let mut rate = 1.0f64;
        for (i, image) in self.images.iter_mut().enumerate() {
            let t = time * rate;
            let frame = t.floor() as i64;
            let frac = (t - t.floor()) as f32;
            let [w0, w1, w2] = crossfade_weights(frac);
            let scale = weights[i];

            for v in 0..size as i64 {
                for u in 0..size as i64 {
                    let blended = lattice.get(frame, u, v) * w0
                        + lattice.get(frame + 1, u, v) * w1
                        + lattice.get(frame + 2, u, v) * w2;
                    image.data[v as usize * size + u as usize] = blended * scale;
                }
            }

            rate *= time_multiplier;
        }
    }

    fn ensure_layout(&mut self, octaves: usize) {
        if self.images.len() != octaves || self.images.first().map(|i| i.size) != Some(self.size) {
            let size = self.size;
            self.images.clear();
            self.images.extend((0..octaves).map(|_| OctaveImage::zeroed(size)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> SynthParams {
        SynthParams {
            octaves: 4,
            falloff: 0.6,
            ..SynthParams::default()
        }
    }

    #[test]
    fn test_octave_weights_sum_to_one() {
        for &falloff in &[0.1, 0.3, 0.6, 0.9] {
            for octaves in 1..=MAX_OCTAVES {
                let weights = octave_weights(falloff, octaves);
                let sum: f32 = weights.iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1e-5,
                    "weights sum {} for falloff {} octaves {}",
                    sum,
                    falloff,
                    octaves
                );
            }
        }
    }

    #[test]
    fn test_crossfade_weights_sum_invariant() {
        for i in 0..=100 {
            let frac = i as f32 / 100.0;
            let [w0, w1, w2] = crossfade_weights(frac);
            assert!((w0 + w1 + w2 - 1.0).abs() < 1e-5);
            assert!(w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0);
        }
    }

    #[test]
    fn test_crossfade_continuous_at_frame_boundary() {
        // Approaching frac=1 on frames (f, f+1, f+2) must match frac=0 on
        // frames (f+1, f+2, f+3): outgoing weight hits zero, the others
        // line up with the shifted triple.
        let end = crossfade_weights(1.0);
        let start = crossfade_weights(0.0);
        assert!(end[0].abs() < 1e-6);
        assert!((end[1] - start[0]).abs() < 1e-5);
        assert!((end[2] - start[1]).abs() < 1e-5);
        assert!(start[2].abs() < 1e-6);
    }

    #[test]
    fn test_compose_continuous_in_time() {
        let lattice = NoiseLattice::new(16, 4, 5);
        let params = test_params();
        let eps = 1e-4;

        // Sample straddling an integer frame boundary
        for &t in &[0.37, 0.9999, 1.9999, 2.5] {
            let mut a = OctaveStack::new(lattice.size());
            let mut b = OctaveStack::new(lattice.size());
            a.compose(&lattice, t, &params);
            b.compose(&lattice, t + eps, &params);

            for i in 0..a.len() {
                for v in 0..lattice.size() as i64 {
                    for u in 0..lattice.size() as i64 {
                        let diff = (a.image(i).get(u, v) - b.image(i).get(u, v)).abs();
                        assert!(diff < 0.01, "discontinuity {} at t={}", diff, t);
                    }
                }
            }
        }
    }

    #[test]
    fn test_octave_count_clamped() {
        let lattice = NoiseLattice::new(8, 4, 5);
        let mut stack = OctaveStack::new(lattice.size());
        let mut params = test_params();
        params.octaves = 99;
        stack.compose(&lattice, 0.0, &params);
        assert_eq!(stack.len(), MAX_OCTAVES);

        params.octaves = 0;
        stack.compose(&lattice, 0.0, &params);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_sample_linear_matches_get_at_integers() {
        let lattice = NoiseLattice::new(8, 4, 11);
        let mut stack = OctaveStack::new(lattice.size());
        stack.compose(&lattice, 0.25, &test_params());

        let image = stack.image(0);
        for v in 0..8 {
            for u in 0..8 {
                let exact = image.get(u, v);
                let sampled = image.sample_linear(u as f32, v as f32);
                assert!((exact - sampled).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_upsample_constant_identity() {
        let mut image = OctaveImage::zeroed(8);
        for value in &mut image.data {
            *value = 0.375;
        }

        for factor_log2 in 0..4 {
            let span = 8i64 << factor_log2;
            for y in -span..span {
                for x in -span..span {
                    let sampled = image.sample_upsampled(x, y, factor_log2);
                    assert!(
                        (sampled - 0.375).abs() < 1e-6,
                        "constant not preserved at ({}, {}) factor 2^{}",
                        x,
                        y,
                        factor_log2
                    );
                }
            }
        }

        // Fractional sampling preserves the constant too
        assert!((image.sample_linear(3.7, -1.2) - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_clock_pause_freezes_time() {
        let mut clock = NoiseClock::new();
        clock.advance(0.016, 1.0, false);
        let t = clock.time();
        assert!(t > 0.0);

        for _ in 0..10 {
            clock.advance(0.016, 1.0, true);
        }
        assert_eq!(clock.time(), t);

        clock.advance(0.016, 1.0, false);
        assert!(clock.time() > t);
    }

    #[test]
    fn test_clock_smooths_irregular_deltas() {
        let mut clock = NoiseClock::new();
        for _ in 0..100 {
            clock.advance(0.016, 1.0, false);
        }
        let steady = clock.time();

        // One wild spike must not jump time by anywhere near the raw spike
        clock.advance(1.0, 1.0, false);
        let jump = clock.time() - steady;
        assert!(jump < 0.25, "spike leaked through low-pass: {}", jump);
    }
}
