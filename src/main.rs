//! Swellfield - headless driver for the ocean height-field synthesizer
//!
//! Runs the full synthesis pipeline at a fixed rate with no window or
//! GPU: the rendering consumer is external, this binary stands in for it
//! by sampling a displaced probe grid and reporting surface statistics.

use clap::Parser;

use swellfield::cli::Args;
use swellfield::params::GridConfig;
use swellfield::surface::{ground_quad, SurfaceGrid};
use swellfield::synth::SurfaceSynth;

const STEP_DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();

    let args = Args::parse();
    let params = args.to_params();

    println!("Swellfield - procedural ocean height-field synthesizer");
    println!(
        "lattice {}x{}, {} octaves, falloff {}, seed {}\n",
        args.size, args.size, params.octaves, params.falloff, params.seed
    );

    let mut synth = match SurfaceSynth::new(args.size, args.packed_size, &params) {
        Ok(synth) => synth,
        Err(e) => {
            eprintln!("Failed to create synthesizer: {}", e);
            std::process::exit(1);
        }
    };

    let grid_config = GridConfig::default();
    let mut grid = SurfaceGrid::new(&grid_config);
    let corners = ground_quad(100.0);

    for step in 0..args.steps {
        synth.step(STEP_DT, &params);
        grid.displace(&synth, &corners, &params);

        if step % 30 == 0 || step + 1 == args.steps {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for vertex in &grid.vertices {
                min = min.min(vertex.position[1]);
                max = max.max(vertex.position[1]);
            }
            let center = synth.height_at(0.0, 0.0, &params);
            println!(
                "step {:>4}: height min {:>7.3} m, max {:>7.3} m, center {:>7.3} m",
                step, min, max, center
            );
        }
    }

    let pyramid = synth.pyramid();
    let vertex_bytes = bytemuck::cast_slice::<_, u8>(&grid.vertices).len();
    println!(
        "\n{} packed tile(s), {} mip levels each, {}x{} base; probe mesh {} vertices ({} bytes)",
        pyramid.tile_count(),
        pyramid.tile(0).level_count(),
        pyramid.tile_size(),
        pyramid.tile_size(),
        grid.vertices.len(),
        vertex_bytes
    );
}
