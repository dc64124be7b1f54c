//! Height queries, projected-grid mapping and displaced render geometry.

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::params::{GridConfig, SynthParams};
use crate::synth::lattice::LATTICE_MAGNITUDE;
use crate::synth::octaves::OctaveStack;
use crate::synth::SurfaceSynth;

const MIN_SCALE: f32 = 1.0e-6;

/// Vertex data for the displaced surface mesh (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Authoritative point height: fractal sum over the composited octave
/// grids, doubling the lookup coordinate per octave.
///
/// This is the exact path used for single-point queries (object
/// placement, camera floating); bulk geometry goes through the cheaper
/// packed tiles on the consumer side. The octave images carry their
/// falloff weights already, so the sum stays within the lattice
/// magnitude and the result within ±strength.
pub fn fractal_height(stack: &OctaveStack, x: f32, z: f32, params: &SynthParams) -> f32 {
    if !params.displace {
        return 0.0;
    }
    let scale = params.scale.max(MIN_SCALE);
    let mut u = x * scale;
    let mut v = z * scale;
    let mut sum = 0.0;
    for image in stack.images() {
        sum += image.sample_linear(u, v);
        u *= 2.0;
        v *= 2.0;
    }
    sum * params.strength / LATTICE_MAGNITUDE
}

/// Map a unit-grid position onto the ground plane through four projected
/// corner positions in homogeneous coordinates.
///
/// Corners are ordered [(0,0), (1,0), (0,1), (1,1)] in (u, v). Bilinear
/// interpolation happens in homogeneous space before the perspective
/// divide, which is what concentrates grid density near the viewer.
pub fn project(u: f32, v: f32, corners: &[Vec4; 4]) -> Vec3 {
    let near = corners[0].lerp(corners[1], u);
    let far = corners[2].lerp(corners[3], u);
    let p = near.lerp(far, v);
    if p.w.abs() < 1.0e-6 {
        // Degenerate projection (corner at infinity); fall back to the
        // unscaled position rather than dividing by ~zero
        return p.truncate();
    }
    p.truncate() / p.w
}

/// Axis-aligned ground quad corners spanning ±`extent`, w = 1.
///
/// Convenience for overhead (non-perspective) sampling of the surface.
pub fn ground_quad(extent: f32) -> [Vec4; 4] {
    [
        Vec4::new(-extent, 0.0, -extent, 1.0),
        Vec4::new(extent, 0.0, -extent, 1.0),
        Vec4::new(-extent, 0.0, extent, 1.0),
        Vec4::new(extent, 0.0, extent, 1.0),
    ]
}

/// Regular parametric grid displaced onto the synthesized surface.
///
/// Vertices and indices are laid out for direct consumer upload
/// (triangle list, counter-clockwise winding).
pub struct SurfaceGrid {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Vertices per side
    side: usize,
    cpu_normals: bool,
    /// Height scratch, kept across frames to avoid reallocation
    heights: Vec<f32>,
}

impl SurfaceGrid {
    pub fn new(config: &GridConfig) -> Self {
        let grid_size = config.grid_size.max(1);
        let side = grid_size + 1;

        let vertices = vec![
            Vertex {
                position: [0.0; 3],
                normal: [0.0, 1.0, 0.0],
            };
            side * side
        ];

        // Triangle indices (counter-clockwise winding)
        let mut indices = Vec::with_capacity(grid_size * grid_size * 6);
        for z in 0..grid_size {
            for x in 0..grid_size {
                let top_left = (z * side + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * side + x) as u32;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Self {
            vertices,
            indices,
            side,
            cpu_normals: config.cpu_normals,
            heights: vec![0.0; side * side],
        }
    }

    pub fn vertices_per_side(&self) -> usize {
        self.side
    }

    /// Project the parametric grid through `corners`, displace it by the
    /// synthesized height field, then (optionally) smooth and compute
    /// normals.
    pub fn displace(
        &mut self,
        synth: &SurfaceSynth,
        corners: &[Vec4; 4],
        params: &SynthParams,
    ) {
        let side = self.side;
        let step = 1.0 / (side - 1).max(1) as f32;

        for j in 0..side {
            for i in 0..side {
                let pos = project(i as f32 * step, j as f32 * step, corners);
                let idx = j * side + i;
                self.heights[idx] = fractal_height(synth.octaves(), pos.x, pos.z, params);
                self.vertices[idx].position = [pos.x, pos.y, pos.z];
            }
        }

        if params.smooth {
            smooth_heights(&mut self.heights, side);
        }

        for (vertex, &height) in self.vertices.iter_mut().zip(&self.heights) {
            vertex.position[1] += height;
        }

        if self.cpu_normals {
            self.compute_normals();
        } else {
            for vertex in &mut self.vertices {
                vertex.normal = [0.0, 1.0, 0.0];
            }
        }
    }

    /// Central-difference normals for interior vertices; boundary rows and
    /// columns keep the default up-normal.
    fn compute_normals(&mut self) {
        let side = self.side;
        for vertex in &mut self.vertices {
            vertex.normal = [0.0, 1.0, 0.0];
        }
        if side < 3 {
            return;
        }
        for j in 1..side - 1 {
            for i in 1..side - 1 {
                let p = |jj: usize, ii: usize| Vec3::from_array(self.vertices[jj * side + ii].position);
                let du = p(j, i + 1) - p(j, i - 1);
                let dv = p(j + 1, i) - p(j - 1, i);
                let normal = dv.cross(du).try_normalize().unwrap_or(Vec3::Y);
                self.vertices[j * side + i].normal = normal.to_array();
            }
        }
    }
}

/// 5-point smoothing of a sampled height grid: center weight 4, axis
/// neighbors 1, normalized by 8. Boundary samples are left untouched.
fn smooth_heights(heights: &mut [f32], side: usize) {
    if side < 3 {
        return;
    }
    let source = heights.to_vec();
    for j in 1..side - 1 {
        for i in 1..side - 1 {
            let idx = j * side + i;
            heights[idx] = (source[idx] * 4.0
                + source[idx - 1]
                + source[idx + 1]
                + source[idx - side]
                + source[idx + side])
                / 8.0;
        }
    }
}
