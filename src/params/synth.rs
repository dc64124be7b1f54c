//! Height-field synthesizer parameters.

/// Live tunable parameters for the height-field synthesizer.
///
/// Owned by the caller's configuration layer; the engine reads a reference
/// every call and tolerates values changing between frames. Out-of-range
/// values are clamped at the point of use, never surfaced as errors.
#[derive(Debug, Clone)]
pub struct SynthParams {
    /// Number of active noise octaves (clamped to 1..=MAX_OCTAVES at use)
    pub octaves: usize,

    /// Per-octave weight decay (geometric falloff, typically in (0, 1))
    pub falloff: f32,

    /// Spatial frequency: lattice texels per world meter
    pub scale: f32,

    /// Wall-clock to noise-time multiplier (dimensionless)
    pub animation_speed: f32,

    /// Per-octave frame-ring advance rate multiplier; each successive
    /// octave animates at the previous octave's rate times this value
    pub time_multiplier: f32,

    /// Vertical displacement amplitude in meters
    pub strength: f32,

    /// Freezes noise-time accumulation while true
    pub paused: bool,

    /// Enables 5-point smoothing of sampled grid heights
    pub smooth: bool,

    /// If false, all queried heights are zero (synthesis still runs)
    pub displace: bool,

    /// Lattice RNG seed
    pub seed: u64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            falloff: 0.6,
            scale: 0.05,
            animation_speed: 1.0,
            time_multiplier: 0.6,
            strength: 2.0,
            paused: false,
            smooth: true,
            displace: true,
            seed: 42,
        }
    }
}
