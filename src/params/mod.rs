//! Parameter definitions with physical units and documented semantics.

mod grid;
mod synth;

// Re-export all types
pub use grid::GridConfig;
pub use synth::SynthParams;
