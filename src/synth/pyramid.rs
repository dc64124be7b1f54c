//! Packed octave tiles with box-filtered mip chains for consumer upload.

use crate::synth::octaves::OctaveStack;

/// Octaves blended into one tile. A tiling policy, not a hardware
/// constraint; the pack logic accepts any positive group size.
pub const DEFAULT_OCTAVES_PER_TILE: usize = 4;

/// One packed sampling surface: a group of octaves summed into a single
/// grid, plus its full mip chain down to 1x1.
pub struct PackedTile {
    /// levels[0] is full resolution; each subsequent level halves per side
    levels: Vec<Vec<f32>>,
    size: usize,
}

impl PackedTile {
    fn zeroed(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        let mut levels = Vec::new();
        let mut s = size;
        loop {
            levels.push(vec![0.0; s * s]);
            if s == 1 {
                break;
            }
            s /= 2;
        }
        Self { levels, size }
    }

    /// Full-resolution tile size per side.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Read-only view of one mip level, row-major. Level 0 is full
    /// resolution; the last level is a single texel.
    pub fn level(&self, index: usize) -> &[f32] {
        &self.levels[index]
    }

    /// Rebuild the mip chain from level 0 by repeated 2x2 box averaging.
    ///
    /// Each level derives from the immediately coarser already-filtered
    /// level, not from level 0. This matches the original derivation order
    /// and its (visually negligible) rounding drift.
    fn build_mips(&mut self) {
        for l in 1..self.levels.len() {
            let src_size = self.size >> (l - 1);
            let dst_size = self.size >> l;
            let (done, rest) = self.levels.split_at_mut(l);
            let src = &done[l - 1];
            let dst = &mut rest[0];
            for v in 0..dst_size {
                for u in 0..dst_size {
                    let a = src[(v * 2) * src_size + u * 2];
                    let b = src[(v * 2) * src_size + u * 2 + 1];
                    let c = src[(v * 2 + 1) * src_size + u * 2];
                    let d = src[(v * 2 + 1) * src_size + u * 2 + 1];
                    dst[v * dst_size + u] = (a + b + c + d) * 0.25;
                }
            }
        }
    }
}

/// All packed tiles for the current frame.
///
/// Exclusively owns and regenerates every tile and mip level on each
/// `pack` call; levels are always consistent with the animation time the
/// octaves were composed at.
pub struct PackedPyramid {
    tiles: Vec<PackedTile>,
    tile_size: usize,
    octaves_per_tile: usize,
}

impl PackedPyramid {
    /// `tile_size` is rounded up to a power of two; `octaves_per_tile`
    /// below 1 is clamped to 1.
    pub fn new(tile_size: usize, octaves_per_tile: usize) -> Self {
        Self {
            tiles: Vec::new(),
            tile_size: tile_size.max(1).next_power_of_two(),
            octaves_per_tile: octaves_per_tile.max(1),
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile(&self, index: usize) -> &PackedTile {
        &self.tiles[index]
    }

    /// Read-only upload hook: all tiles for the consumer to copy into its
    /// own sampling structure (texture memory or otherwise).
    pub fn tiles(&self) -> &[PackedTile] {
        &self.tiles
    }

    /// Pack composited octaves into tiles and rebuild every mip chain.
    ///
    /// Within a group the highest-index octave is the base address space;
    /// each lower-index (coarser-moving, heavier-weighted) octave in the
    /// group contributes through bilinear upsampling at twice the factor
    /// of its successor. Tiles larger than the octave resolution push even
    /// the base through the upsampler.
    pub fn pack(&mut self, stack: &OctaveStack) {
        let octaves = stack.len();
        if octaves == 0 {
            self.tiles.clear();
            return;
        }
        let tile_count = octaves.div_ceil(self.octaves_per_tile);
        if self.tiles.len() != tile_count
            || self.tiles.first().map(|t| t.size) != Some(self.tile_size)
        {
            let size = self.tile_size;
            self.tiles.clear();
            self.tiles.extend((0..tile_count).map(|_| PackedTile::zeroed(size)));
        }

        // Tile resolution may exceed octave resolution; the extra factor
        // applies on top of the per-octave doubling.
        let base_log2 = self.tile_size.trailing_zeros() as i32
            - stack.size().trailing_zeros() as i32;
        debug_assert!(base_log2 >= 0, "tile smaller than octave resolution");

        let tile_size = self.tile_size;
        for (g, tile) in self.tiles.iter_mut().enumerate() {
            let first = g * self.octaves_per_tile;
            let last = (first + self.octaves_per_tile).min(octaves) - 1;

            for y in 0..tile_size as i64 {
                for x in 0..tile_size as i64 {
                    let mut acc = 0.0;
                    for j in first..=last {
                        let factor_log2 = (last - j) as u32 + base_log2 as u32;
                        acc += stack.image(j).sample_upsampled(x, y, factor_log2);
                    }
                    tile.levels[0][y as usize * tile_size + x as usize] = acc;
                }
            }

            tile.build_mips();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SynthParams;
    use crate::synth::lattice::NoiseLattice;

    fn composed_stack(size: usize, octaves: usize) -> OctaveStack {
        let lattice = NoiseLattice::new(size, 4, 13);
        let mut stack = OctaveStack::new(lattice.size());
        let params = SynthParams {
            octaves,
            ..SynthParams::default()
        };
        stack.compose(&lattice, 0.4, &params);
        stack
    }

    #[test]
    fn test_tile_count_is_ceil_of_octaves_over_group() {
        for (octaves, expected) in [(1, 1), (4, 1), (5, 2), (8, 2), (9, 3)] {
            let stack = composed_stack(16, octaves);
            let mut pyramid = PackedPyramid::new(16, 4);
            pyramid.pack(&stack);
            assert_eq!(pyramid.tile_count(), expected, "octaves={}", octaves);
        }
    }

    #[test]
    fn test_mip_chain_shape() {
        let stack = composed_stack(16, 4);
        let mut pyramid = PackedPyramid::new(16, 4);
        pyramid.pack(&stack);

        let tile = pyramid.tile(0);
        assert_eq!(tile.level_count(), 5); // 16, 8, 4, 2, 1
        assert_eq!(tile.level(0).len(), 256);
        assert_eq!(tile.level(4).len(), 1);
    }

    #[test]
    fn test_mip_mean_invariant() {
        let stack = composed_stack(32, 6);
        let mut pyramid = PackedPyramid::new(32, 4);
        pyramid.pack(&stack);

        for tile in pyramid.tiles() {
            let full = tile.level(0);
            let mean: f32 = full.iter().sum::<f32>() / full.len() as f32;
            let coarsest = tile.level(tile.level_count() - 1)[0];
            assert!(
                (mean - coarsest).abs() < 1e-4,
                "mip mean drift: {} vs {}",
                mean,
                coarsest
            );
        }
    }

    #[test]
    fn test_tile_larger_than_octave_resolution() {
        let stack = composed_stack(16, 4);
        let mut pyramid = PackedPyramid::new(64, 4);
        pyramid.pack(&stack);

        assert_eq!(pyramid.tile_size(), 64);
        let tile = pyramid.tile(0);
        assert_eq!(tile.level(0).len(), 64 * 64);
        assert!(tile.level(0).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_repack_after_octave_count_change() {
        let mut pyramid = PackedPyramid::new(16, 4);

        let stack = composed_stack(16, 8);
        pyramid.pack(&stack);
        assert_eq!(pyramid.tile_count(), 2);

        let stack = composed_stack(16, 3);
        pyramid.pack(&stack);
        assert_eq!(pyramid.tile_count(), 1);
    }
}
