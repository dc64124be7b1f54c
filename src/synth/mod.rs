//! The height-field synthesizer: lattice, octaves and packed pyramid
//! driven by one per-frame entry point.

pub mod lattice;
pub mod octaves;
pub mod pyramid;

use std::time::Instant;

use crate::params::SynthParams;
use crate::surface;
use lattice::NoiseLattice;
use octaves::{NoiseClock, OctaveStack};
use pyramid::{PackedPyramid, DEFAULT_OCTAVES_PER_TILE};

/// Animation frame slots in the lattice ring buffer (power of two)
pub const NOISE_FRAMES: usize = 8;

/// Procedural height-field synthesizer for a projected-grid ocean surface.
///
/// Owns all engine state explicitly: the read-only lattice, the per-frame
/// octave stack and the packed mip pyramid. Single-threaded and
/// call-driven; one `advance_and_synthesize` per rendered frame, with a
/// strict compose → pack → mip ordering inside.
pub struct SurfaceSynth {
    lattice: NoiseLattice,
    stack: OctaveStack,
    pyramid: PackedPyramid,
    clock: NoiseClock,
    last_call: Instant,
    seed: u64,
}

impl SurfaceSynth {
    /// Build the lattice and allocate all derived buffers.
    ///
    /// `size` is the lattice/octave resolution and `packed_size` the tile
    /// resolution; both are rounded up to powers of two (`packed_size` at
    /// least to `size`). Only a genuinely unsatisfiable request errors;
    /// everything else is clamped.
    pub fn new(size: usize, packed_size: usize, params: &SynthParams) -> Result<Self, String> {
        if size == 0 {
            return Err("lattice size must be nonzero".to_string());
        }

        let lattice = NoiseLattice::new(size, NOISE_FRAMES, params.seed);
        let packed_size = packed_size.max(lattice.size()).next_power_of_two();
        log::info!(
            "surface synth: lattice {0}x{0}, {1} frames, packed tiles {2}x{2}",
            lattice.size(),
            lattice.frame_count(),
            packed_size
        );

        let mut synth = Self {
            stack: OctaveStack::new(lattice.size()),
            pyramid: PackedPyramid::new(packed_size, DEFAULT_OCTAVES_PER_TILE),
            lattice,
            clock: NoiseClock::new(),
            last_call: Instant::now(),
            seed: params.seed,
        };

        // Derived buffers are valid from construction on
        synth.step(0.0, params);
        Ok(synth)
    }

    /// Regenerate the lattice and every derived buffer at a new
    /// resolution. All prior derived state is invalidated; parameters are
    /// untouched (they live with the caller).
    pub fn resize(&mut self, size: usize, packed_size: usize, params: &SynthParams) {
        self.lattice = NoiseLattice::new(size.max(2), NOISE_FRAMES, self.seed);
        let packed_size = packed_size.max(self.lattice.size()).next_power_of_two();
        log::info!(
            "surface synth resize: lattice {0}x{0}, packed tiles {1}x{1}",
            self.lattice.size(),
            packed_size
        );
        self.stack = OctaveStack::new(self.lattice.size());
        self.pyramid = PackedPyramid::new(packed_size, DEFAULT_OCTAVES_PER_TILE);
        self.step(0.0, params);
    }

    /// Per-frame entry point: measure the wall-clock delta since the last
    /// call and recompute octaves, packed tiles and mips.
    pub fn advance_and_synthesize(&mut self, params: &SynthParams) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_call).as_secs_f32();
        self.last_call = now;
        self.step(dt, params);
    }

    /// Deterministic fixed-delta variant of `advance_and_synthesize`,
    /// used by tests and fixed-rate offline drivers.
    pub fn step(&mut self, dt: f32, params: &SynthParams) {
        self.clock.advance(dt, params.animation_speed, params.paused);
        self.stack.compose(&self.lattice, self.clock.time(), params);
        self.pyramid.pack(&self.stack);
    }

    /// Authoritative height at a world (x, z) position. Reads the
    /// composited octaves directly, not the packed tiles.
    pub fn height_at(&self, x: f32, z: f32, params: &SynthParams) -> f32 {
        surface::fractal_height(&self.stack, x, z, params)
    }

    /// The composited octave stack (exact sampling path).
    pub fn octaves(&self) -> &OctaveStack {
        &self.stack
    }

    /// Read-only packed pyramid for consumer upload after a synthesis
    /// call.
    pub fn pyramid(&self) -> &PackedPyramid {
        &self.pyramid
    }

    /// Current lattice resolution per side.
    pub fn lattice_size(&self) -> usize {
        self.lattice.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_params() -> SynthParams {
        SynthParams {
            octaves: 4,
            falloff: 0.6,
            scale: 1.0,
            strength: 1.0,
            seed: 42,
            ..SynthParams::default()
        }
    }

    #[test]
    fn test_scenario_height_bounded_and_deterministic() {
        let params = scenario_params();

        let mut a = SurfaceSynth::new(64, 64, &params).unwrap();
        let mut b = SurfaceSynth::new(64, 64, &params).unwrap();
        a.step(1.0 / 60.0, &params);
        b.step(1.0 / 60.0, &params);

        let ha = a.height_at(0.0, 0.0, &params);
        let hb = b.height_at(0.0, 0.0, &params);

        assert!(ha.abs() <= params.strength);
        assert_eq!(ha, hb, "same seed and steps must agree");
    }

    #[test]
    fn test_pause_produces_identical_output() {
        let params = SynthParams {
            paused: true,
            ..scenario_params()
        };
        let mut synth = SurfaceSynth::new(32, 32, &params).unwrap();

        synth.step(1.0 / 60.0, &params);
        let before: Vec<f32> = synth.pyramid().tile(0).level(0).to_vec();
        let h_before = synth.height_at(3.0, 4.0, &params);

        for _ in 0..5 {
            synth.step(1.0 / 60.0, &params);
        }

        assert_eq!(synth.pyramid().tile(0).level(0), &before[..]);
        assert_eq!(synth.height_at(3.0, 4.0, &params), h_before);
    }

    #[test]
    fn test_unpaused_output_changes_over_time() {
        let params = scenario_params();
        let mut synth = SurfaceSynth::new(32, 32, &params).unwrap();

        synth.step(0.1, &params);
        let before: Vec<f32> = synth.pyramid().tile(0).level(0).to_vec();
        for _ in 0..10 {
            synth.step(0.1, &params);
        }

        assert_ne!(synth.pyramid().tile(0).level(0), &before[..]);
    }

    #[test]
    fn test_resize_invalidates_derived_buffers() {
        let params = scenario_params();
        let mut synth = SurfaceSynth::new(64, 64, &params).unwrap();
        synth.step(1.0 / 60.0, &params);
        assert_eq!(synth.lattice_size(), 64);
        assert_eq!(synth.octaves().size(), 64);

        synth.resize(128, 128, &params);
        assert_eq!(synth.lattice_size(), 128);
        assert_eq!(synth.octaves().size(), 128);
        assert_eq!(synth.pyramid().tile_size(), 128);
        for tile in synth.pyramid().tiles() {
            assert_eq!(tile.level(0).len(), 128 * 128);
        }

        // Heights still well-formed after resize
        let h = synth.height_at(5.0, -5.0, &params);
        assert!(h.is_finite() && h.abs() <= params.strength);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(SurfaceSynth::new(0, 64, &scenario_params()).is_err());
    }

    #[test]
    fn test_live_parameter_changes_between_frames() {
        let mut params = scenario_params();
        let mut synth = SurfaceSynth::new(32, 32, &params).unwrap();
        synth.step(0.1, &params);
        assert_eq!(synth.octaves().len(), 4);

        // Caller tweaks the shared parameter set; next call must follow
        params.octaves = 7;
        synth.step(0.1, &params);
        assert_eq!(synth.octaves().len(), 7);
        assert_eq!(synth.pyramid().tile_count(), 2);
    }
}
