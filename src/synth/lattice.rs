//! Base noise lattice: smoothed uniform random frames with toroidal wrap.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Magnitude bound for lattice values (all samples lie in ±this)
pub const LATTICE_MAGNITUDE: f32 = 0.5;

/// Toroidal base noise grid, one frame per animation ring-buffer slot.
///
/// Frames are generated once at construction (or resize) and read-only
/// afterwards. Size and frame count are powers of two so wrap-around
/// indexing reduces to a bitmask.
pub struct NoiseLattice {
    /// `frames * size * size` smoothed values, frame-major
    values: Vec<f32>,
    size: usize,
    mask: usize,
    frame_count: usize,
    frame_mask: usize,
}

impl NoiseLattice {
    /// Create a lattice of `frames` smoothed random frames, `size`×`size` each.
    ///
    /// Non-power-of-two sizes are rounded up; a fresh pseudo-random draw is
    /// taken from `seed` (no noise state persists across constructions).
    pub fn new(size: usize, frames: usize, seed: u64) -> Self {
        let size = size.max(2).next_power_of_two();
        let frames = frames.max(2).next_power_of_two();
        let mask = size - 1;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let raw: Vec<f32> = (0..frames * size * size)
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();

        // 3x3 toroidal smoothing: center weight 6, edge/corner weight 1,
        // normalized by 14, scaled to the configured magnitude.
        let mut values = vec![0.0f32; raw.len()];
        for f in 0..frames {
            let base = f * size * size;
            for v in 0..size {
                let up = (v.wrapping_sub(1)) & mask;
                let down = (v + 1) & mask;
                for u in 0..size {
                    let left = (u.wrapping_sub(1)) & mask;
                    let right = (u + 1) & mask;

                    let center = raw[base + v * size + u];
                    let edges = raw[base + up * size + u]
                        + raw[base + down * size + u]
                        + raw[base + v * size + left]
                        + raw[base + v * size + right];
                    let corners = raw[base + up * size + left]
                        + raw[base + up * size + right]
                        + raw[base + down * size + left]
                        + raw[base + down * size + right];

                    values[base + v * size + u] =
                        (center * 6.0 + edges + corners) / 14.0 * LATTICE_MAGNITUDE;
                }
            }
        }

        Self {
            values,
            size,
            mask,
            frame_count: frames,
            frame_mask: frames - 1,
        }
    }

    /// Lattice resolution per side (power of two).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of animation frames in the ring buffer (power of two).
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Toroidal lookup: any `frame`, `u`, `v` (including negatives) wrap
    /// modulo the respective power-of-two extent via bitmask.
    #[inline]
    pub fn get(&self, frame: i64, u: i64, v: i64) -> f32 {
        let f = (frame & self.frame_mask as i64) as usize;
        let u = (u & self.mask as i64) as usize;
        let v = (v & self.mask as i64) as usize;
        self.values[f * self.size * self.size + v * self.size + u]
    }
}
