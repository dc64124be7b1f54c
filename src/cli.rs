//! Command-line argument parsing.

use clap::Parser;

use crate::params::SynthParams;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Swellfield")]
#[command(about = "Procedural ocean height-field synthesizer", long_about = None)]
pub struct Args {
    /// Lattice resolution per side (rounded up to a power of two)
    #[arg(long, value_name = "TEXELS", default_value = "64")]
    pub size: usize,

    /// Packed tile resolution per side (rounded up, at least the lattice size)
    #[arg(long, value_name = "TEXELS", default_value = "64")]
    pub packed_size: usize,

    /// Number of noise octaves
    #[arg(long, value_name = "COUNT", default_value = "6")]
    pub octaves: usize,

    /// Per-octave weight falloff
    #[arg(long, value_name = "FACTOR", default_value = "0.6")]
    pub falloff: f32,

    /// Vertical displacement amplitude (meters)
    #[arg(long, value_name = "METERS", default_value = "2.0")]
    pub strength: f32,

    /// Lattice RNG seed
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,

    /// Number of fixed-rate steps to run
    #[arg(long, value_name = "STEPS", default_value = "120")]
    pub steps: usize,

    /// Freeze noise-time accumulation
    #[arg(long)]
    pub paused: bool,

    /// Run synthesis but force all heights to zero
    #[arg(long)]
    pub no_displace: bool,
}

impl Args {
    /// Build the synthesizer parameter set from command-line arguments
    pub fn to_params(&self) -> SynthParams {
        SynthParams {
            octaves: self.octaves,
            falloff: self.falloff,
            strength: self.strength,
            seed: self.seed,
            paused: self.paused,
            displace: !self.no_displace,
            ..SynthParams::default()
        }
    }
}
