//! Swellfield - real-time procedural ocean height-field synthesizer
//!
//! Multi-octave fractal noise over an animated lattice ring buffer,
//! packed into mip pyramids for a rendering consumer, with exact point
//! height queries for physics-style placement.

pub mod cli;
pub mod params;
pub mod surface;
pub mod synth;
