//! Render-grid configuration for the surface projector.

/// Configuration for the displaced render grid handed to a consumer.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Grid resolution (cells per side; vertex count is (size + 1)^2)
    pub grid_size: usize,

    /// Compute per-vertex normals on the CPU via central differences.
    /// When false, boundary and interior normals are all left as +Y
    /// (a shader-side consumer derives its own).
    pub cpu_normals: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 64,
            cpu_normals: true,
        }
    }
}
